//! Lightweight global operational counters for the WAL.
//!
//! Thread-safe atomic counters, read by the bundled CLI and by embedders
//! that want a cheap view into WAL activity without wiring up a full metrics
//! pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

static RECORDS_APPENDED: AtomicU64 = AtomicU64::new(0);
static BYTES_APPENDED: AtomicU64 = AtomicU64::new(0);
static FSYNC_CALLS: AtomicU64 = AtomicU64::new(0);
static SEGMENTS_CUT: AtomicU64 = AtomicU64::new(0);
static LOCKS_ACQUIRED: AtomicU64 = AtomicU64::new(0);
static LOCKS_RELEASED: AtomicU64 = AtomicU64::new(0);
static CRC_MISMATCHES: AtomicU64 = AtomicU64::new(0);

pub(crate) fn record_append(bytes: usize) {
    RECORDS_APPENDED.fetch_add(1, Ordering::Relaxed);
    BYTES_APPENDED.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub(crate) fn record_fsync() {
    FSYNC_CALLS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_cut() {
    SEGMENTS_CUT.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_lock_acquired() {
    LOCKS_ACQUIRED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_lock_released() {
    LOCKS_RELEASED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_crc_mismatch() {
    CRC_MISMATCHES.fetch_add(1, Ordering::Relaxed);
}

/// A point-in-time snapshot of every counter, for the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot {
    pub records_appended: u64,
    pub bytes_appended: u64,
    pub fsync_calls: u64,
    pub segments_cut: u64,
    pub locks_acquired: u64,
    pub locks_released: u64,
    pub crc_mismatches: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        records_appended: RECORDS_APPENDED.load(Ordering::Relaxed),
        bytes_appended: BYTES_APPENDED.load(Ordering::Relaxed),
        fsync_calls: FSYNC_CALLS.load(Ordering::Relaxed),
        segments_cut: SEGMENTS_CUT.load(Ordering::Relaxed),
        locks_acquired: LOCKS_ACQUIRED.load(Ordering::Relaxed),
        locks_released: LOCKS_RELEASED.load(Ordering::Relaxed),
        crc_mismatches: CRC_MISMATCHES.load(Ordering::Relaxed),
    }
}
