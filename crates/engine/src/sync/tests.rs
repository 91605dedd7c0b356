use super::*;
use crate::classify::{CorrectionKind, LineShift};

const WINDOW: Duration = Duration::from_millis(50);

fn refresh(line: usize) -> PendingCorrection {
	PendingCorrection::new(line, CorrectionKind::RefreshDate)
}

fn insert(line: usize) -> PendingCorrection {
	PendingCorrection::new(line, CorrectionKind::InsertPrefix)
}

fn batch(corrections: Vec<PendingCorrection>) -> Classification {
	Classification {
		shifts: Vec::new(),
		corrections,
	}
}

fn lines(state: &DocSyncState) -> Vec<usize> {
	state.pending().map(|c| c.line).collect()
}

#[test]
fn test_record_moves_idle_to_collecting() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	assert_eq!(state.phase(), SyncPhase::Idle);

	assert!(state.record(t0, batch(vec![refresh(2)])));
	assert_eq!(state.phase(), SyncPhase::Collecting);
	assert_eq!(state.pending_len(), 1);
}

#[test]
fn test_empty_record_stays_idle() {
	let mut state = DocSyncState::new();
	assert!(state.record(Instant::now(), batch(Vec::new())));
	assert_eq!(state.phase(), SyncPhase::Idle);
}

#[test]
fn test_last_write_wins_per_line() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![insert(3)]));
	state.record(t0, batch(vec![refresh(3)]));

	let queued: Vec<_> = state.pending().copied().collect();
	assert_eq!(queued, vec![refresh(3)]);
}

#[test]
fn test_due_after_quiet_window() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(0)]));
	state.record(t0 + Duration::from_millis(30), batch(vec![refresh(1)]));

	assert!(!state.is_due(t0 + Duration::from_millis(60), WINDOW, 256));
	assert_eq!(state.deadline(WINDOW, 256), Some(t0 + Duration::from_millis(80)));
	assert!(state.is_due(t0 + Duration::from_millis(80), WINDOW, 256));
}

#[test]
fn test_due_immediately_when_queue_is_full() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch((0..4).map(refresh).collect()));
	assert!(state.is_due(t0, WINDOW, 4));
	assert!(!state.is_due(t0, WINDOW, 5));
	assert_eq!(state.deadline(WINDOW, 4), Some(t0));
	assert_eq!(state.deadline(WINDOW, 5), Some(t0 + WINDOW));
}

#[test]
fn test_take_for_commit_orders_descending() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1), insert(7), refresh(4)]));

	let commit = state.take_for_commit(t0, 9);
	assert_eq!(commit.generation, 9);
	assert_eq!(
		commit.corrections.iter().map(|c| c.line).collect::<Vec<_>>(),
		vec![7, 4, 1]
	);
	assert_eq!(state.phase(), SyncPhase::Committing);
	assert!(state.is_in_flight());
	assert_eq!(state.pending_len(), 0);
}

#[test]
fn test_changes_during_commit_wait_for_next_commit() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	let commit = state.take_for_commit(t0 + WINDOW, 1);

	let later = t0 + WINDOW * 2;
	state.record(later, batch(vec![refresh(5)]));
	assert_eq!(state.phase(), SyncPhase::Committing);
	assert!(!state.is_due(later + WINDOW, WINDOW, 1));
	assert_eq!(state.deadline(WINDOW, 256), None);

	assert!(state.mark_complete(commit.generation, CommitResult::Applied));
	assert_eq!(state.phase(), SyncPhase::Collecting);
	assert!(state.is_due(later + WINDOW, WINDOW, 256));
	assert_eq!(lines(&state), vec![5]);
}

#[test]
fn test_failed_commit_clears_flag_without_retry() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	let commit = state.take_for_commit(t0, 3);

	assert!(state.mark_complete(commit.generation, CommitResult::Failed));
	assert!(!state.is_in_flight());
	assert_eq!(state.phase(), SyncPhase::Idle);
	assert_eq!(state.pending_len(), 0);
}

#[test]
fn test_stale_completion_is_ignored() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	state.take_for_commit(t0, 4);

	assert!(!state.mark_complete(3, CommitResult::Applied));
	assert!(state.is_in_flight());
	assert!(state.mark_complete(4, CommitResult::Applied));
}

#[test]
fn test_disable_drops_queue_and_ignores_records() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	state.disable();

	assert_eq!(state.phase(), SyncPhase::Disabled);
	assert_eq!(state.pending_len(), 0);
	assert!(!state.record(t0, batch(vec![refresh(2)])));
	assert!(!state.schedule(t0, refresh(2)));
	assert_eq!(state.pending_len(), 0);

	state.enable();
	assert_eq!(state.phase(), SyncPhase::Idle);
}

#[test]
fn test_disable_during_commit_keeps_flag_until_settled() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	let commit = state.take_for_commit(t0, 1);

	state.disable();
	assert!(state.is_in_flight());

	state.enable();
	assert_eq!(state.phase(), SyncPhase::Committing);

	assert!(state.mark_complete(commit.generation, CommitResult::Applied));
	assert_eq!(state.phase(), SyncPhase::Idle);
}

#[test]
fn test_completion_after_disable_stays_disabled() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1)]));
	let commit = state.take_for_commit(t0, 1);
	state.disable();

	assert!(state.mark_complete(commit.generation, CommitResult::Applied));
	assert_eq!(state.phase(), SyncPhase::Disabled);
	assert!(!state.is_in_flight());
}

#[test]
fn test_queued_lines_follow_line_shifts() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	state.record(t0, batch(vec![refresh(1), refresh(4), refresh(6)]));

	// Lines 3..=4 collapse into line 3; everything below moves up by one.
	state.record(
		t0,
		Classification {
			shifts: vec![LineShift {
				start: 3,
				end: 4,
				inserted_breaks: 0,
				carries_start: false,
			}],
			corrections: vec![refresh(3)],
		},
	);
	assert_eq!(lines(&state), vec![1, 3, 5]);

	// Two lines inserted after line 0.
	state.record(
		t0,
		Classification {
			shifts: vec![LineShift {
				start: 0,
				end: 0,
				inserted_breaks: 2,
				carries_start: false,
			}],
			corrections: vec![insert(1), insert(2)],
		},
	);
	assert_eq!(lines(&state), vec![1, 2, 3, 5, 7]);
}

#[test]
fn test_schedule_keeps_override() {
	let t0 = Instant::now();
	let mut state = DocSyncState::new();
	let correction = PendingCorrection {
		sequence_override: Some(500),
		..insert(2)
	};
	assert!(state.schedule(t0, correction));
	assert_eq!(state.pending().next(), Some(&correction));
	assert_eq!(state.phase(), SyncPhase::Collecting);
}
