use prost::Message;

use crate::error::{Result, WalError};
use crate::metrics;
use crate::record::RecordType;
use crate::types::{Entry, HardState, SnapshotPointer};

use super::{Mode, Wal};

impl Wal {
    /// Persists `hard_state` (unless empty, §4.6) and `entries` in order,
    /// then flushes and fsyncs. A successful return guarantees both are on
    /// stable storage.
    pub fn save(&mut self, hard_state: &HardState, entries: &[Entry]) -> Result<()> {
        let disable_fsync = self.config.disable_fsync;
        let encoder = self.appending_encoder()?;

        if !hard_state.is_empty() {
            encoder.encode(RecordType::State, None, hard_state.encode_to_vec())?;
        }
        for entry in entries {
            encoder.encode(RecordType::Entry, None, entry.encode_to_vec())?;
        }
        encoder.flush()?;
        if !disable_fsync {
            encoder.get_ref().sync_all()?;
            metrics::record_fsync();
        }
        for entry in entries {
            metrics::record_append(entry.data.len());
        }

        if !hard_state.is_empty() {
            self.state = hard_state.clone();
        }
        if let Some(last) = entries.last() {
            self.enti = last.index;
        }
        Ok(())
    }

    /// Persists a `snapshot` record, advancing `enti` if `snap.index`
    /// exceeds it, then flushes and fsyncs.
    pub fn save_snapshot(&mut self, snap: &SnapshotPointer) -> Result<()> {
        let disable_fsync = self.config.disable_fsync;
        let encoder = self.appending_encoder()?;
        encoder.encode(RecordType::Snapshot, None, snap.encode_to_vec())?;
        encoder.flush()?;
        if !disable_fsync {
            encoder.get_ref().sync_all()?;
            metrics::record_fsync();
        }

        self.enti = self.enti.max(snap.index);
        Ok(())
    }

    pub(super) fn appending_encoder(&mut self) -> Result<&mut crate::record::Encoder<std::fs::File>> {
        match &mut self.mode {
            Mode::Appending { encoder } => Ok(encoder),
            _ => Err(WalError::WrongMode("this operation requires append mode")),
        }
    }
}
