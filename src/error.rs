//! Typed errors surfaced by the WAL's public API.
//!
//! Unlike the rest of this codebase's usual `anyhow::Result` everywhere, the
//! WAL's callers must branch on the failure kind (a `CRCMismatch` means
//! corruption, a `SnapshotNotFound` is a decision point, not a fault), so the
//! library boundary uses this enum instead of an opaque error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::wal::ReadAll;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal directory already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("no wal segment covers the requested snapshot: {0}")]
    FileNotFound(String),

    #[error("crc chain mismatch in {dir} at record #{record_index}: stored {stored:#010x}, computed {computed:#010x}")]
    CRCMismatch {
        dir: PathBuf,
        record_index: u64,
        stored: u32,
        computed: u32,
    },

    #[error("metadata mismatch across segments: {0}")]
    MetadataConflict(String),

    #[error("snapshot mismatch at index {index}: expected term {expected}, found term {found}")]
    SnapshotMismatch {
        index: u64,
        expected: u64,
        found: u64,
    },

    /// Carries whatever `read_all` recovered before hitting end-of-stream —
    /// the caller decides whether to proceed on an unmatched start point.
    #[error("starting snapshot (index={index}, term={term}) was never matched while reading")]
    SnapshotNotFound {
        index: u64,
        term: u64,
        partial: Box<ReadAll>,
    },

    #[error("unexpected record type {0} in segment {1}")]
    UnexpectedRecordType(i64, PathBuf),

    #[error("wal is not in the expected mode: {0}")]
    WrongMode(&'static str),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, WalError>;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock {0} is held by another process")]
    WouldBlock(PathBuf),

    #[error("failed to lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
