//! Record framing and the CRC-chained encoder/decoder (§4.1, §6.2).
//!
//! A record is the length-delimited, field-tagged serialization of
//! `{type: int64, crc: uint32, data: bytes}`, byte-compatible with the wire
//! format used by the consensus ecosystem this WAL participates in. The
//! `crc` field carries either this record's data CRC (validated against the
//! running chain) or, for a `crc` record, the previous epoch's terminal
//! value.

use std::io::{self, BufWriter, Read, Write};

use prost::Message;

use crate::error::{Result, WalError};

/// Record type codes (§6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Metadata = 1,
    Entry = 2,
    State = 3,
    Crc = 4,
    Snapshot = 5,
}

impl RecordType {
    fn from_i64(v: i64) -> Option<Self> {
        match v {
            1 => Some(Self::Metadata),
            2 => Some(Self::Entry),
            3 => Some(Self::State),
            4 => Some(Self::Crc),
            5 => Some(Self::Snapshot),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Record {
    #[prost(int64, tag = "1")]
    pub r#type: i64,
    #[prost(uint32, tag = "2")]
    pub crc: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}

impl Record {
    pub fn type_of(&self) -> Option<RecordType> {
        RecordType::from_i64(self.r#type)
    }
}

/// Streaming encoder over a buffered sink, chaining a running CRC-32C across
/// every non-`crc` record it writes (§4.1).
pub struct Encoder<W: Write> {
    sink: BufWriter<W>,
    crc: u32,
}

impl<W: Write> Encoder<W> {
    /// `prev_crc` seeds the running hasher: 0 for a brand new WAL, or the
    /// terminal CRC of the prior epoch when continuing a chain across a
    /// segment boundary or a read→append transition.
    pub fn new(sink: W, prev_crc: u32) -> Self {
        Self {
            sink: BufWriter::new(sink),
            crc: prev_crc,
        }
    }

    /// Encode and write one record. For a `crc` record, `data` must be empty
    /// and the caller's `crc` value (the previous epoch's terminal CRC) is
    /// used verbatim — the running hasher is not advanced.
    pub fn encode(&mut self, rec_type: RecordType, crc_override: Option<u32>, data: Vec<u8>) -> Result<()> {
        let crc = if rec_type == RecordType::Crc {
            crc_override.expect("crc record requires an explicit crc value")
        } else {
            debug_assert!(crc_override.is_none());
            self.crc = crc32c::crc32c_append(self.crc, &data);
            self.crc
        };
        let rec = Record {
            r#type: rec_type as i64,
            crc,
            data,
        };
        let mut framed = Vec::with_capacity(rec.encoded_len() + 10);
        rec.encode_length_delimited(&mut framed)
            .expect("encoding into a Vec cannot fail");
        self.sink.write_all(&framed)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// The running CRC after the last non-`crc` record written, used to seed
    /// the next epoch (e.g. the next segment's header `crc` record).
    pub fn running_crc(&self) -> u32 {
        self.crc
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.sink.into_inner().map_err(|e| e.into_error())
    }

    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }
}

/// Streaming decoder over a (possibly multi-segment) byte source, validating
/// the CRC chain lazily at each `crc` record boundary (§4.1).
pub struct Decoder<R: Read> {
    src: R,
    crc: u32,
}

impl<R: Read> Decoder<R> {
    pub fn new(src: R) -> Self {
        Self { src, crc: 0 }
    }

    /// Reads and frames the next record. Returns `Ok(None)` on a clean
    /// end-of-stream (no bytes at all before the length prefix).
    pub fn decode(&mut self) -> Result<Option<Record>> {
        let len = match read_varint(&mut self.src)? {
            Some(len) => len,
            None => return Ok(None),
        };
        let mut buf = vec![0u8; len as usize];
        self.src.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                WalError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "wal: truncated record body",
                ))
            } else {
                WalError::Io(e)
            }
        })?;
        let rec = Record::decode(&buf[..])
            .map_err(|e| WalError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if rec.type_of() != Some(RecordType::Crc) {
            self.crc = crc32c::crc32c_append(self.crc, &rec.data);
        }
        Ok(Some(rec))
    }

    /// Re-seed the running CRC, invoked by the WAL once it has validated a
    /// `crc` record (§4.5).
    pub fn update_crc(&mut self, v: u32) {
        self.crc = v;
    }

    /// The current running CRC, used as the seed for the append epoch when
    /// transitioning out of read mode (§4.5).
    pub fn last_crc(&self) -> u32 {
        self.crc
    }

    pub fn into_inner(self) -> R {
        self.src
    }
}

/// Reads a protobuf-style base-128 varint length prefix. Returns `Ok(None)`
/// if the stream ends cleanly before any byte of a new varint is read; a
/// partial varint (torn write mid-prefix) is an `UnexpectedEof` error, which
/// callers treat identically to a truncated record body.
fn read_varint<R: Read>(src: &mut R) -> Result<Option<u64>> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    let mut first = true;
    loop {
        let mut byte = [0u8; 1];
        match src.read(&mut byte) {
            Ok(0) => {
                return if first {
                    Ok(None)
                } else {
                    Err(WalError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "wal: truncated length prefix",
                    )))
                };
            }
            Ok(_) => {}
            Err(e) => return Err(WalError::Io(e)),
        }
        first = false;
        result |= ((byte[0] & 0x7f) as u64) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(Some(result));
        }
        shift += 7;
        if shift >= 64 {
            return Err(WalError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "wal: length prefix overflow",
            )));
        }
    }
}
