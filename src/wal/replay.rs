use prost::Message as _;

use crate::error::{Result, WalError};
use crate::metrics;
use crate::record::{Encoder, RecordType};
use crate::types::{Entry, HardState, SnapshotPointer};

use super::{Mode, Wal};

/// Everything `read_all` recovered from the log, ready to reconstruct the
/// consensus node's in-memory state (§4.5).
#[derive(Debug, Default)]
pub struct ReadAll {
    pub metadata: Vec<u8>,
    pub state: HardState,
    pub entries: Vec<Entry>,
}

impl Wal {
    /// Replays every record from `start` to end-of-stream (§4.5), then
    /// transitions the WAL from read mode to append mode. May be called only
    /// once, and only while in read mode (`WrongMode` otherwise).
    ///
    /// A clean end-of-stream that never matched `start`'s snapshot pointer is
    /// reported as `SnapshotNotFound`, carrying the records read so far so
    /// the caller (the consensus node) can decide whether a fresh WAL with
    /// no matching snapshot yet is fatal or expected (§7); the transition to
    /// append mode still happens in that case. Any other error leaves the
    /// WAL in read mode, unchanged, so the caller can inspect it or `close`
    /// it.
    pub fn read_all(&mut self) -> Result<ReadAll> {
        let Mode::Reading { decoder, start, .. } = &mut self.mode else {
            return Err(WalError::WrongMode("read_all requires read mode"));
        };
        let start = *start;

        let mut out = ReadAll::default();
        let mut metadata_seen: Option<Vec<u8>> = None;
        let mut matched = false;
        let mut record_index: u64 = 0;
        let mut enti = self.enti;

        while let Some(rec) = decoder.decode()? {
            record_index += 1;
            match rec.type_of() {
                Some(RecordType::Entry) => {
                    let entry = Entry::decode(&rec.data[..]).map_err(decode_err)?;
                    if entry.index > start.index {
                        let pos = (entry.index - start.index - 1) as usize;
                        if pos < out.entries.len() {
                            out.entries.truncate(pos);
                        }
                        out.entries.push(entry.clone());
                    }
                    enti = enti.max(entry.index);
                }
                Some(RecordType::State) => {
                    out.state = HardState::decode(&rec.data[..]).map_err(decode_err)?;
                }
                Some(RecordType::Metadata) => match &metadata_seen {
                    Some(prev) if prev != &rec.data => {
                        return Err(WalError::MetadataConflict(format!(
                            "segment metadata differs from earlier segments ({} vs {} bytes)",
                            rec.data.len(),
                            prev.len()
                        )));
                    }
                    Some(_) => {}
                    None => metadata_seen = Some(rec.data.clone()),
                },
                Some(RecordType::Crc) => {
                    let running = decoder.last_crc();
                    if running != 0 && rec.crc != running {
                        metrics::record_crc_mismatch();
                        return Err(WalError::CRCMismatch {
                            dir: self.dir.clone(),
                            record_index,
                            stored: rec.crc,
                            computed: running,
                        });
                    }
                    decoder.update_crc(rec.crc);
                }
                Some(RecordType::Snapshot) => {
                    let snap = SnapshotPointer::decode(&rec.data[..]).map_err(decode_err)?;
                    if snap.index == start.index {
                        if snap.term != start.term {
                            return Err(WalError::SnapshotMismatch {
                                index: snap.index,
                                expected: start.term,
                                found: snap.term,
                            });
                        }
                        matched = true;
                    }
                    enti = enti.max(snap.index);
                }
                None => {
                    return Err(WalError::UnexpectedRecordType(rec.r#type, self.dir.clone()));
                }
            }
        }

        self.enti = enti;
        self.metadata = metadata_seen.unwrap_or_default();
        out.metadata = self.metadata.clone();
        self.state = out.state.clone();

        let last_crc = decoder.last_crc();
        let Mode::Reading { write_file, .. } = std::mem::replace(&mut self.mode, Mode::Transitioning) else {
            unreachable!("checked above");
        };
        self.mode = Mode::Appending {
            encoder: Encoder::new(write_file, last_crc),
        };

        if !matched {
            return Err(WalError::SnapshotNotFound {
                index: start.index,
                term: start.term,
                partial: Box::new(out),
            });
        }

        Ok(out)
    }
}

fn decode_err(e: prost::DecodeError) -> WalError {
    WalError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
