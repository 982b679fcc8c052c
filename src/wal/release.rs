use crate::metrics;

use super::Wal;

impl Wal {
    /// Releases and destroys every held lock whose segment's `first_index`
    /// is <= `index` (§4.8). Stops at the first lock above `index` — locks
    /// are held in ascending first-index order, so this is a prefix.
    ///
    /// The currently active segment can itself be released if its
    /// first-index falls at or below `index`; that is intended (§9).
    pub fn release_lock_to(&mut self, index: u64) {
        let cut = self.locks.partition_point(|h| h.first_index <= index);
        for held in self.locks.drain(..cut) {
            if let Err(e) = held.lock.unlock() {
                log::warn!("wal: failed to unlock segment (first_index={}): {e}", held.first_index);
            }
            held.lock.destroy();
            metrics::record_lock_released();
        }
    }
}
