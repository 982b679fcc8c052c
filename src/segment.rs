//! Segment file naming, directory scanning, and index search (§4.2).

use std::fs::File;
use std::path::Path;

pub const SEGMENT_EXT: &str = "wal";

/// `wal_name(seq, first_index) -> "ssss...-iiii...wal"` (§6.1).
pub fn wal_name(seq: u64, first_index: u64) -> String {
    format!("{seq:016x}-{first_index:016x}.{SEGMENT_EXT}")
}

/// Parses a segment file name back into `(seq, first_index)`. Fails on
/// anything not matching the exact `SSSS...-IIII....wal` shape.
pub fn parse_wal_name(name: &str) -> Option<(u64, u64)> {
    let stem = name.strip_suffix(&format!(".{SEGMENT_EXT}"))?;
    let (seq_s, idx_s) = stem.split_once('-')?;
    if seq_s.len() != 16 || idx_s.len() != 16 {
        return None;
    }
    if !seq_s.bytes().all(|b| b.is_ascii_hexdigit()) || !idx_s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let seq = u64::from_str_radix(seq_s, 16).ok()?;
    let first_index = u64::from_str_radix(idx_s, 16).ok()?;
    Some((seq, first_index))
}

/// A parsed, well-formed WAL segment name paired with its file path.
#[derive(Debug, Clone)]
pub struct SegmentName {
    pub path: std::path::PathBuf,
    pub seq: u64,
    pub first_index: u64,
}

/// Filters `dir`'s entries down to well-formed WAL segment names, sorted
/// ascending by sequence number (§4.2).
pub fn scan_dir(dir: &Path) -> std::io::Result<Vec<SegmentName>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((seq, first_index)) = parse_wal_name(name) {
            out.push(SegmentName {
                path: entry.path(),
                seq,
                first_index,
            });
        }
    }
    out.sort_by_key(|s| s.seq);
    Ok(out)
}

/// True iff sequence numbers in `list` are strictly monotonically
/// increasing by exactly 1.
pub fn is_valid_seq(list: &[SegmentName]) -> bool {
    list.windows(2).all(|w| w[1].seq == w[0].seq + 1)
}

/// Opens every segment from `list` for reading, in order, without taking any
/// locks. Meant for read-only inspection tooling (§6.7) rather than the WAL
/// itself, which always pairs a read with a lock attempt (§4.5).
pub fn open_for_reading(list: &[SegmentName]) -> std::io::Result<Vec<File>> {
    list.iter().map(|s| File::open(&s.path)).collect()
}

/// Returns the position of the last segment whose `first_index` is <= `idx`
/// (binary search by first-index, §4.2). `None` if `list` is empty or every
/// segment's `first_index` exceeds `idx`.
pub fn search_index(list: &[SegmentName], idx: u64) -> Option<usize> {
    if list.is_empty() || list[0].first_index > idx {
        return None;
    }
    let mut lo = 0usize;
    let mut hi = list.len();
    while lo + 1 < hi {
        let mid = (lo + hi) / 2;
        if list[mid].first_index <= idx {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        let name = wal_name(7, 42);
        assert_eq!(name, "0000000000000007-000000000000002a.wal");
        assert_eq!(parse_wal_name(&name), Some((7, 42)));
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(parse_wal_name("not-a-wal-file.txt"), None);
        assert_eq!(parse_wal_name("zzzzzzzzzzzzzzzz-0000000000000000.wal"), None);
        assert_eq!(parse_wal_name("0000000000000001-0000000000000000.log"), None);
    }

    fn seg(seq: u64, first_index: u64) -> SegmentName {
        SegmentName {
            path: std::path::PathBuf::from(wal_name(seq, first_index)),
            seq,
            first_index,
        }
    }

    #[test]
    fn valid_seq_detects_gaps() {
        let ok = vec![seg(0, 0), seg(1, 10), seg(2, 20)];
        assert!(is_valid_seq(&ok));
        let gap = vec![seg(0, 0), seg(2, 10)];
        assert!(!is_valid_seq(&gap));
    }

    #[test]
    fn search_index_finds_covering_segment() {
        let list = vec![seg(0, 0), seg(1, 10), seg(2, 25)];
        assert_eq!(search_index(&list, 0), Some(0));
        assert_eq!(search_index(&list, 9), Some(0));
        assert_eq!(search_index(&list, 10), Some(1));
        assert_eq!(search_index(&list, 24), Some(1));
        assert_eq!(search_index(&list, 25), Some(2));
        assert_eq!(search_index(&list, 1000), Some(2));
    }

    #[test]
    fn search_index_empty_or_future_start() {
        assert_eq!(search_index(&[], 0), None);
        let list = vec![seg(0, 5)];
        assert_eq!(search_index(&list, 0), None);
    }
}
