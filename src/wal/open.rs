use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::WalConfig;
use crate::error::{LockError, Result, WalError};
use crate::lock::SegmentLock;
use crate::metrics;
use crate::record::Decoder;
use crate::segment::{is_valid_seq, scan_dir, search_index, SegmentName};
use crate::types::SnapshotPointer;

use super::{ChainReader, HeldLock, Mode, Wal};

impl Wal {
    /// Opens an existing WAL in read mode, positioned to replay from
    /// `start` (§4.5). Call `read_all` next, then `save`/`cut`/etc.
    ///
    /// `require_all`: if true, failing to lock any segment in the read tail
    /// aborts the open; if false, the read tail is truncated at the first
    /// segment a live producer holds.
    pub fn open(dir: &Path, start: SnapshotPointer, require_all: bool) -> Result<Self> {
        Self::open_with_config(dir, start, Some(require_all), WalConfig::default())
    }

    /// As `open`, but `require_all = None` falls back to
    /// `config.require_all_segments` (§6.5), and `config.disable_fsync`
    /// gates the fsyncs this handle performs from here on.
    pub fn open_with_config(
        dir: &Path,
        start: SnapshotPointer,
        require_all: Option<bool>,
        config: WalConfig,
    ) -> Result<Self> {
        let require_all = require_all.unwrap_or(config.require_all_segments);
        let all = scan_dir(dir)?;
        if all.is_empty() {
            return Err(WalError::FileNotFound(format!(
                "no wal segments under {}",
                dir.display()
            )));
        }
        let pos = search_index(&all, start.index).ok_or_else(|| {
            WalError::FileNotFound(format!(
                "no segment covers index {} under {}",
                start.index,
                dir.display()
            ))
        })?;
        let tail = &all[pos..];
        if !is_valid_seq(tail) {
            return Err(WalError::FileNotFound(format!(
                "gap in wal segment sequence under {}",
                dir.display()
            )));
        }

        let mut included: Vec<SegmentName> = Vec::new();
        let mut read_files: Vec<File> = Vec::new();
        let mut held: Vec<HeldLock> = Vec::new();
        let mut truncated_at: Option<PathBuf> = None;

        for seg in tail {
            let read_file = File::open(&seg.path)?;
            let lock = SegmentLock::new(&seg.path)?;
            match lock.try_lock() {
                Ok(()) => {
                    metrics::record_lock_acquired();
                    read_files.push(read_file);
                    held.push(HeldLock {
                        first_index: seg.first_index,
                        lock,
                    });
                    included.push(seg.clone());
                }
                Err(LockError::WouldBlock(path)) => {
                    if require_all {
                        release_all(held);
                        return Err(WalError::Lock(LockError::WouldBlock(path)));
                    }
                    log::warn!(
                        "wal open: read tail truncated at {} (held by another process)",
                        seg.path.display()
                    );
                    truncated_at = Some(path);
                    break;
                }
                Err(e) => {
                    release_all(held);
                    return Err(WalError::Lock(e));
                }
            }
        }

        // A segment this process couldn't lock cannot become its own write
        // target: if nothing got locked, there is no append-safe segment to
        // open, even though reading the (empty) tail succeeded.
        let Some(last) = included.last() else {
            release_all(held);
            return Err(WalError::Lock(LockError::WouldBlock(
                truncated_at.unwrap_or_else(|| tail[0].path.clone()),
            )));
        };
        let seq = last.seq;
        let write_path = last.path.clone();
        let write_file = OpenOptions::new().append(true).open(&write_path)?;

        let decoder = Decoder::new(ChainReader::new(read_files));

        Ok(Self {
            dir: dir.to_path_buf(),
            metadata: Vec::new(),
            state: Default::default(),
            enti: start.index,
            seq,
            locks: held,
            config,
            mode: Mode::Reading {
                decoder,
                start,
                write_file,
            },
        })
    }
}

fn release_all(held: Vec<HeldLock>) {
    for h in held {
        let _ = h.lock.unlock();
        h.lock.destroy();
        metrics::record_lock_released();
    }
}
