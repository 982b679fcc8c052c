//! Minimal payload shapes the WAL needs to read through.
//!
//! The consensus module's real entry/hard-state/snapshot types are an
//! external collaborator (see module docs on [`crate::wal`]) — the WAL
//! never interprets their bytes beyond the fields below. These are that
//! minimal shape: enough for a standalone library to be buildable and
//! testable, encoded with the same length-delimited, field-tagged codec
//! used for [`crate::record::Record`] itself.

use prost::Message;

/// A single committed log entry.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct Entry {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}

/// The consensus module's durable voting/commit state.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct HardState {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(uint64, tag = "2")]
    pub vote: u64,
    #[prost(uint64, tag = "3")]
    pub commit: u64,
}

impl HardState {
    /// A hard state is empty iff every field is zero (§4.6).
    pub fn is_empty(&self) -> bool {
        self.term == 0 && self.vote == 0 && self.commit == 0
    }
}

/// A pointer to a point up to which the raft log has been snapshotted.
#[derive(Clone, Copy, PartialEq, Eq, Message)]
pub struct SnapshotPointer {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
}
