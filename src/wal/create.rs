use std::fs::{self, OpenOptions};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

use prost::Message;

use crate::config::WalConfig;
use crate::error::{Result, WalError};
use crate::lock::SegmentLock;
use crate::metrics;
use crate::record::{Encoder, RecordType};
use crate::segment::wal_name;
use crate::types::{HardState, SnapshotPointer};

use super::{HeldLock, Mode, Wal};

const DIR_MODE: u32 = 0o700;
const SEGMENT_MODE: u32 = 0o600;

impl Wal {
    /// Creates a brand new WAL directory and writes the first segment's
    /// header records (§4.4). Fails with `AlreadyExists` if `dir` exists.
    pub fn create(dir: &Path, metadata: Vec<u8>) -> Result<Self> {
        Self::create_with_config(dir, metadata, WalConfig::default())
    }

    /// As `create`, but `config.disable_fsync` gates every fsync this
    /// handle performs from here on (§6.5) — never enable against real data.
    pub fn create_with_config(dir: &Path, metadata: Vec<u8>, config: WalConfig) -> Result<Self> {
        if dir.exists() {
            return Err(WalError::AlreadyExists(dir.to_path_buf()));
        }
        fs::create_dir_all(dir)?;
        set_dir_mode(dir)?;

        let path = dir.join(wal_name(0, 0));
        let mut open_opts = OpenOptions::new();
        open_opts.create_new(true).read(true).write(true);
        #[cfg(unix)]
        open_opts.mode(SEGMENT_MODE);
        let file = open_opts.open(&path)?;
        set_segment_mode(&path)?;

        let lock = SegmentLock::new(&path)?;
        lock.lock()?;
        metrics::record_lock_acquired();

        let mut encoder = Encoder::new(file, 0);
        encoder.encode(RecordType::Crc, Some(0), Vec::new())?;
        encoder.encode(RecordType::Metadata, None, metadata.clone())?;
        encoder.encode(RecordType::Snapshot, None, SnapshotPointer::default().encode_to_vec())?;
        encoder.flush()?;
        if !config.disable_fsync {
            encoder.get_ref().sync_all()?;
            metrics::record_fsync();
        }

        log::debug!("created wal at {} with first segment {}", dir.display(), path.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            metadata,
            state: HardState::default(),
            enti: 0,
            seq: 0,
            locks: vec![HeldLock { first_index: 0, lock }],
            config,
            mode: Mode::Appending { encoder },
        })
    }
}

#[cfg(unix)]
fn set_dir_mode(dir: &Path) -> std::io::Result<()> {
    fs::set_permissions(dir, fs::Permissions::from_mode(DIR_MODE))
}
#[cfg(not(unix))]
fn set_dir_mode(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_segment_mode(path: &Path) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(SEGMENT_MODE))
}
#[cfg(not(unix))]
fn set_segment_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
