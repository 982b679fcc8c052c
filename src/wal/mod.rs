//! The WAL state machine (§3, §4.4-§4.9).
//!
//! Split the way the teacher codebase splits its larger subsystems: one file
//! per operation group, a shared struct definition in this module.
//!
//! - `create`  — `Wal::create`, the initial-directory-and-header path.
//! - `open`    — `Wal::open`, directory scan + lock acquisition + decoder setup.
//! - `replay`  — `Wal::read_all`, the record-by-record replay algorithm.
//! - `append`  — `Wal::save` / `Wal::save_snapshot`.
//! - `cut`     — `Wal::cut`, segment rotation.
//! - `release` — `Wal::release_lock_to`.
//! - `close`   — `Wal::close`.
//!
//! The external collaborators this WAL serves — the consensus module that
//! produces entries/hard states, the snapshot store, the directory lock
//! manager — are not part of this crate (§1); `Entry`/`HardState`/
//! `SnapshotPointer` (see [`crate::types`]) are the minimal shapes needed to
//! make this a standalone, testable library.

use std::fs::File;
use std::path::PathBuf;

use crate::config::WalConfig;
use crate::lock::SegmentLock;
use crate::record::{Decoder, Encoder};
use crate::types::{HardState, SnapshotPointer};

mod append;
mod chain_reader;
mod close;
mod create;
mod cut;
mod open;
mod release;
mod replay;

pub use chain_reader::ChainReader;
pub use replay::ReadAll;

/// One segment lock the WAL currently owns, tagged with the first-index its
/// segment was created with (needed by `release_lock_to`, §4.8).
struct HeldLock {
    first_index: u64,
    lock: SegmentLock,
}

/// The read/append split modeled as a tagged union, not nullable fields
/// (§9) — a `Wal` is in exactly one of these shapes at a time, and the
/// transition from `Reading` to `Appending` is one-way (§3).
enum Mode {
    Reading {
        decoder: Decoder<ChainReader>,
        start: SnapshotPointer,
        write_file: File,
    },
    Appending {
        encoder: Encoder<File>,
    },
    /// Momentary placeholder used only while `read_all` moves fields out of
    /// `Reading` and into `Appending`; never observed by any other method.
    Transitioning,
}

pub struct Wal {
    dir: PathBuf,
    metadata: Vec<u8>,
    state: HardState,
    /// Highest index observed: written as an entry, or advanced by a
    /// snapshot record whose index exceeds it (§3).
    enti: u64,
    seq: u64,
    /// Ordered by segment sequence; all currently held by this WAL (§3).
    locks: Vec<HeldLock>,
    config: WalConfig,
    mode: Mode,
}

impl Wal {
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub fn state(&self) -> &HardState {
        &self.state
    }

    pub fn committed_index(&self) -> u64 {
        self.enti
    }

    pub fn is_appending(&self) -> bool {
        matches!(self.mode, Mode::Appending { .. })
    }
}
