use std::fs::OpenOptions;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use prost::Message;

use crate::error::{Result, WalError};
use crate::lock::SegmentLock;
use crate::metrics;
use crate::record::{Encoder, RecordType};
use crate::segment::wal_name;

use super::{HeldLock, Mode, Wal};

const SEGMENT_MODE: u32 = 0o600;

impl Wal {
    /// Rotates to a new segment (§4.7). The new segment is locked before the
    /// old one is closed, so the WAL never has a window without continuous
    /// cross-process protection over its active tail.
    pub fn cut(&mut self) -> Result<()> {
        let disable_fsync = self.config.disable_fsync;
        let Mode::Appending { encoder } = &mut self.mode else {
            return Err(WalError::WrongMode("cut requires append mode"));
        };

        let new_seq = self.seq + 1;
        let first_index = self.enti + 1;
        let path = self.dir.join(wal_name(new_seq, first_index));

        let mut open_opts = OpenOptions::new();
        open_opts.create_new(true).read(true).write(true);
        #[cfg(unix)]
        open_opts.mode(SEGMENT_MODE);
        let new_file = open_opts.open(&path)?;

        let lock = SegmentLock::new(&path)?;
        lock.lock()?;
        metrics::record_lock_acquired();
        self.locks.push(HeldLock { first_index, lock });

        encoder.flush()?;
        if !disable_fsync {
            encoder.get_ref().sync_all()?;
            metrics::record_fsync();
        }

        let prev_crc = encoder.running_crc();
        let mut new_encoder = Encoder::new(new_file, prev_crc);
        new_encoder.encode(RecordType::Crc, Some(prev_crc), Vec::new())?;
        new_encoder.encode(RecordType::Metadata, None, self.metadata.clone())?;
        new_encoder.encode(RecordType::State, None, self.state.encode_to_vec())?;
        new_encoder.flush()?;
        if !disable_fsync {
            new_encoder.get_ref().sync_all()?;
            metrics::record_fsync();
        }

        self.mode = Mode::Appending { encoder: new_encoder };
        self.seq = new_seq;
        metrics::record_cut();
        log::debug!("cut wal segment {} at {}", new_seq, path.display());

        Ok(())
    }
}
