//! Cross-process advisory lock on a segment file (§4.3).
//!
//! Cross-platform (fs2) advisory locks, one per segment path:
//! - `lock()` blocks until acquired — used by appenders (`create`, `cut`).
//! - `try_lock()` fails immediately with `WouldBlock` — used by readers so a
//!   live segment still owned by a producer is detected rather than waited on.
//!
//! Unlike most RAII lock guards in this codebase, release is explicit
//! (`unlock`/`destroy`), per the WAL's ownership model (§9): the WAL tracks
//! every lock it holds in `locks` and tears them down itself in
//! `release_lock_to`/`close`. `Drop` still performs a best-effort unlock as a
//! last-resort safety net and logs if it had to.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::LockError;

pub struct SegmentLock {
    file: Option<File>,
    path: PathBuf,
}

impl SegmentLock {
    /// Opens (without locking) the segment file as a lock handle.
    pub fn new(path: &Path) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| LockError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
        })
    }

    /// Blocking acquisition.
    pub fn lock(&self) -> Result<(), LockError> {
        self.file()
            .lock_exclusive()
            .map_err(|source| LockError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Non-blocking acquisition; `WouldBlock` if another process holds it.
    pub fn try_lock(&self) -> Result<(), LockError> {
        self.file().try_lock_exclusive().map_err(|source| {
            if source.kind() == std::io::ErrorKind::WouldBlock {
                LockError::WouldBlock(self.path.clone())
            } else {
                LockError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }

    pub fn unlock(&self) -> Result<(), LockError> {
        self.file().unlock().map_err(|source| LockError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Releases the underlying file handle, freeing the OS-level resource.
    /// The caller should have already called [`Self::unlock`].
    pub fn destroy(mut self) {
        self.file.take();
    }

    fn file(&self) -> &File {
        self.file.as_ref().expect("lock handle used after destroy")
    }
}

impl Drop for SegmentLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            log::warn!(
                "segment lock for {} dropped without an explicit unlock/destroy",
                self.path.display()
            );
            let _ = file.unlock();
        }
    }
}
