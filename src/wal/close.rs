use crate::error::Result;
use crate::metrics;

use super::{Mode, Wal};

impl Wal {
    /// Flushes and fsyncs the write file, then unlocks and destroys every
    /// held lock (§4.9). Errors tearing down a lock are logged, not
    /// propagated — every remaining lock still gets a teardown attempt.
    pub fn close(mut self) -> Result<()> {
        let disable_fsync = self.config.disable_fsync;
        match &mut self.mode {
            Mode::Appending { encoder } => {
                encoder.flush()?;
                if !disable_fsync {
                    encoder.get_ref().sync_all()?;
                    metrics::record_fsync();
                }
            }
            Mode::Reading { write_file, .. } => {
                use std::io::Write;
                write_file.flush()?;
                if !disable_fsync {
                    write_file.sync_all()?;
                    metrics::record_fsync();
                }
            }
            Mode::Transitioning => {}
        }

        for held in self.locks.drain(..) {
            if let Err(e) = held.lock.unlock() {
                log::warn!("wal: failed to unlock segment (first_index={}): {e}", held.first_index);
            }
            held.lock.destroy();
            metrics::record_lock_released();
        }

        Ok(())
    }
}
