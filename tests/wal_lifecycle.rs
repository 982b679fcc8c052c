use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use oorandom::Rand64;

use raftwal::{Entry, HardState, SnapshotPointer, Wal, WalError};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn unique_root(prefix: &str) -> std::path::PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("raftwal-test-{prefix}-{pid}-{t}-{id}"))
}

fn entry(index: u64, term: u64) -> Entry {
    Entry {
        index,
        term,
        data: format!("payload-{index}").into_bytes(),
    }
}

#[test]
fn create_save_close_then_reopen_replays_everything() -> Result<()> {
    let dir = unique_root("roundtrip");
    let mut wal = Wal::create(&dir, b"cluster-id".to_vec())?;
    assert!(wal.is_appending());

    let state = HardState { term: 1, vote: 7, commit: 0 };
    wal.save(&state, &[entry(1, 1), entry(2, 1)])?;
    wal.save(&HardState::default(), &[entry(3, 1)])?;
    wal.close()?;

    let mut reopened = Wal::open(&dir, SnapshotPointer::default(), true)?;
    let read = reopened.read_all()?;
    assert_eq!(read.entries.len(), 3);
    assert_eq!(read.entries[0].index, 1);
    assert_eq!(read.entries[2].index, 3);
    assert_eq!(read.state.commit, 0);
    assert_eq!(read.state.vote, 7);
    assert_eq!(read.metadata, b"cluster-id");
    assert!(reopened.is_appending());

    reopened.save(&HardState::default(), &[entry(4, 1)])?;
    reopened.close()?;
    Ok(())
}

#[test]
fn later_entry_write_truncates_replayed_tail() -> Result<()> {
    let dir = unique_root("truncate-tail");
    let mut wal = Wal::create(&dir, Vec::new())?;
    wal.save(&HardState::default(), &[entry(1, 1), entry(2, 1), entry(3, 1)])?;
    // A leader re-proposing at index 2 overwrites what followed it.
    wal.save(&HardState::default(), &[entry(2, 2)])?;
    wal.close()?;

    let mut reopened = Wal::open(&dir, SnapshotPointer::default(), true)?;
    let read = reopened.read_all()?;
    assert_eq!(read.entries.len(), 2);
    assert_eq!(read.entries[1].term, 2);
    Ok(())
}

#[test]
fn cut_rotates_segment_and_preserves_chain_across_reopen() -> Result<()> {
    let dir = unique_root("cut");
    let mut wal = Wal::create(&dir, b"meta".to_vec())?;
    wal.save(&HardState::default(), &[entry(1, 1)])?;
    wal.cut()?;
    wal.save(&HardState::default(), &[entry(2, 1), entry(3, 1)])?;
    wal.close()?;

    let segments = raftwal::segment::scan_dir(&dir)?;
    assert_eq!(segments.len(), 2);

    let mut reopened = Wal::open(&dir, SnapshotPointer::default(), true)?;
    let read = reopened.read_all()?;
    assert_eq!(read.entries.len(), 3);
    Ok(())
}

#[test]
fn snapshot_mismatch_is_reported() -> Result<()> {
    // `create` already lays down a snapshot(index=0, term=0) header record,
    // so requesting index 0 with any other term is a mismatch against it.
    let dir = unique_root("snap-mismatch");
    let wal = Wal::create(&dir, Vec::new())?;
    wal.close()?;

    let mut reopened = Wal::open(&dir, SnapshotPointer { index: 0, term: 9 }, true)?;
    let err = reopened.read_all().unwrap_err();
    assert!(matches!(err, WalError::SnapshotMismatch { index: 0, expected: 9, found: 0 }));
    Ok(())
}

#[test]
fn snapshot_not_found_still_carries_partial_read() -> Result<()> {
    let dir = unique_root("snap-not-found");
    let mut wal = Wal::create(&dir, Vec::new())?;
    wal.save(&HardState::default(), &[entry(101, 1), entry(102, 1)])?;
    wal.close()?;

    // Ask to resume from a snapshot index this WAL never recorded.
    let mut reopened = Wal::open(&dir, SnapshotPointer { index: 100, term: 42 }, true)?;
    match reopened.read_all() {
        Err(WalError::SnapshotNotFound { index: 100, term: 42, partial }) => {
            assert_eq!(partial.entries.len(), 2);
        }
        other => panic!("expected SnapshotNotFound, got {other:?}"),
    }
    // The transition to append mode still happened.
    assert!(reopened.is_appending());
    Ok(())
}

#[test]
fn corrupted_tail_is_detected_as_crc_mismatch() -> Result<()> {
    use std::io::Write;

    // The running CRC is only actually checked when a `crc` record is read,
    // which only happens at a segment header — so the corruption needs to
    // land in a segment whose successor's header will validate the chain.
    let dir = unique_root("crc-mismatch");
    let mut wal = Wal::create(&dir, Vec::new())?;
    wal.save(&HardState::default(), &[entry(1, 1)])?;
    wal.cut()?;
    wal.save(&HardState::default(), &[entry(2, 1)])?;
    wal.close()?;

    let segments = raftwal::segment::scan_dir(&dir)?;
    assert_eq!(segments.len(), 2);
    let mut bytes = std::fs::read(&segments[0].path)?;
    let needle = b"payload-1";
    let idx = bytes
        .windows(needle.len())
        .rposition(|w| w == needle)
        .map(|start| start + needle.len() - 1)
        .expect("entry payload present in first segment");
    bytes[idx] ^= 0xff;
    let mut f = std::fs::OpenOptions::new().write(true).truncate(true).open(&segments[0].path)?;
    f.write_all(&bytes)?;
    f.sync_all()?;

    let mut reopened = Wal::open(&dir, SnapshotPointer::default(), true)?;
    let err = reopened.read_all().unwrap_err();
    assert!(matches!(err, WalError::CRCMismatch { .. }));
    Ok(())
}

#[test]
fn release_lock_to_drops_prefix_of_held_locks() -> Result<()> {
    let dir = unique_root("release");
    let mut wal = Wal::create(&dir, Vec::new())?;
    wal.save(&HardState::default(), &[entry(1, 1)])?;
    wal.cut()?;
    wal.save(&HardState::default(), &[entry(2, 1)])?;
    wal.cut()?;
    wal.save(&HardState::default(), &[entry(3, 1)])?;

    // Only the first segment (first_index=0) should be released.
    wal.release_lock_to(0);
    wal.close()?;
    Ok(())
}

#[test]
fn second_opener_of_single_locked_segment_fails_either_way() -> Result<()> {
    // P5/scenario 7, single-segment case: the first writer holds the only
    // segment, so a second opener has no locked segment at all to use as a
    // write target, whether or not it requires the whole tail.
    let dir = unique_root("p5-single-segment");
    let mut first = Wal::create(&dir, Vec::new())?;
    first.save(&HardState::default(), &[entry(1, 1)])?;

    match Wal::open(&dir, SnapshotPointer::default(), true) {
        Err(WalError::Lock(_)) => {}
        other => panic!("expected a lock error with require_all=true, got {}", other.is_ok()),
    }
    match Wal::open(&dir, SnapshotPointer::default(), false) {
        Err(WalError::Lock(_)) => {}
        other => panic!("expected a lock error with require_all=false too, got {}", other.is_ok()),
    }

    first.close()?;
    Ok(())
}

#[test]
fn second_opener_sees_truncated_prefix_when_tail_is_released() -> Result<()> {
    // P5/scenario 7, multi-segment case: the first writer has moved on to a
    // new segment and released the old one, so a second opener with
    // require_all=false can read the released prefix and use it as its
    // write target; require_all=true still fails on the still-held tail.
    let dir = unique_root("p5-multi-segment");
    let mut first = Wal::create(&dir, Vec::new())?;
    first.save(&HardState::default(), &[entry(1, 1)])?;
    first.cut()?;
    first.save(&HardState::default(), &[entry(2, 1)])?;
    first.release_lock_to(0);

    match Wal::open(&dir, SnapshotPointer::default(), true) {
        Err(WalError::Lock(_)) => {}
        other => panic!("expected a lock error with require_all=true, got {}", other.is_ok()),
    }

    let mut second = Wal::open(&dir, SnapshotPointer::default(), false)?;
    let read = second.read_all()?;
    assert_eq!(read.entries.len(), 1);
    assert_eq!(read.entries[0].index, 1);
    second.close()?;

    first.close()?;
    Ok(())
}

#[test]
fn randomized_save_cut_sequence_replays_consistently() -> Result<()> {
    // A deterministic stress run over save/cut: rebuild the expected entry
    // tail in a model alongside the WAL and check replay matches it exactly,
    // including the tail-overwrite rule when a replayed index repeats.
    let dir = unique_root("stress-save-cut");
    let mut wal = Wal::create(&dir, b"stress-meta".to_vec())?;
    let mut rng = Rand64::new(0xA1B2_C3D4_E5F6_7788);

    let mut model: Vec<Entry> = Vec::new();
    let mut next_index = 1u64;
    let mut term = 1u64;

    for step in 0..200u32 {
        if step % 37 == 0 && step > 0 {
            wal.cut()?;
            continue;
        }
        let overwrite = !model.is_empty() && rng.rand_u64().is_multiple_of(5);
        let index = if overwrite {
            model[model.len() / 2].index
        } else {
            let i = next_index;
            next_index += 1;
            i
        };
        if rng.rand_u64().is_multiple_of(11) {
            term += 1;
        }
        let e = entry(index, term);
        wal.save(&HardState { term, vote: 1, commit: index.saturating_sub(1) }, std::slice::from_ref(&e))?;

        let pos = (index - 1) as usize;
        if pos < model.len() {
            model.truncate(pos);
        }
        model.push(e);
    }
    wal.close()?;

    let mut reopened = Wal::open(&dir, SnapshotPointer::default(), true)?;
    let read = reopened.read_all()?;
    assert_eq!(read.entries.len(), model.len());
    for (got, want) in read.entries.iter().zip(model.iter()) {
        assert_eq!(got.index, want.index);
        assert_eq!(got.term, want.term);
    }
    reopened.close()?;
    Ok(())
}

#[test]
fn create_twice_fails_with_already_exists() -> Result<()> {
    let dir = unique_root("already-exists");
    let wal = Wal::create(&dir, Vec::new())?;
    wal.close()?;

    match Wal::create(&dir, Vec::new()) {
        Err(WalError::AlreadyExists(_)) => {}
        other => panic!("expected AlreadyExists, got {}", other.is_ok()),
    }
    Ok(())
}
