//! A segmented, CRC-chained write-ahead log for a replicated consensus node.
//!
//! Records are framed with a field-tagged binary codec and chained with a
//! running CRC-32C that spans segment boundaries (§4.1, §6.2). A [`Wal`]
//! starts life either freshly [`Wal::create`]d or [`Wal::open`]ed for replay;
//! [`Wal::read_all`] consumes the read side and transitions it, one-way, into
//! append mode for [`Wal::save`], [`Wal::save_snapshot`], and [`Wal::cut`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod record;
pub mod segment;
pub mod types;
pub mod wal;

mod lock;

pub use config::WalConfig;
pub use error::{LockError, WalError};
pub use record::{Decoder, Encoder, Record, RecordType};
pub use segment::{parse_wal_name, wal_name, SegmentName};
pub use types::{Entry, HardState, SnapshotPointer};
pub use wal::{ChainReader, ReadAll, Wal};
