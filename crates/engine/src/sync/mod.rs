//! Per-document reconciliation state.
//!
//! [`DocSyncState`] owns a document's pending corrections and its single
//! in-flight commit:
//!
//! ```text
//! Idle -> Collecting -> Committing -> Idle | Collecting
//!   \________\_____________\______-> Disabled -> Idle
//! ```
//!
//! Corrections recorded while a commit is in flight are held for the next
//! commit. Nothing here performs I/O; the reactor in [`crate::SyncEngine`]
//! drives the transitions and runs the commits.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{trace, warn};

use crate::classify::{Classification, PendingCorrection, remap_line};

#[cfg(test)]
mod tests;

/// Current phase of a document's sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
	/// Nothing pending.
	Idle,
	/// Corrections pending, waiting for the coalescing window.
	Collecting,
	/// A commit is in flight.
	Committing,
	/// Closed or out of scope. Records are ignored until re-enabled.
	Disabled,
}

/// Result reported by a finished commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
	/// The edit was applied.
	Applied,
	/// Every correction re-validated to a no-op; nothing was submitted.
	Skipped,
	/// The host rejected the edit or the commit task died. The batch is gone.
	Failed,
}

/// Corrections taken for one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBatch {
	/// Commit generation, echoed back on completion.
	pub generation: u64,
	/// Corrections in descending line order.
	pub corrections: Vec<PendingCorrection>,
}

/// Metadata about an in-flight commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightInfo {
	/// Commit generation.
	pub generation: u64,
	/// When the commit was taken.
	pub started_at: Instant,
}

/// Per-document sync state.
#[derive(Debug)]
pub struct DocSyncState {
	pending: BTreeMap<usize, PendingCorrection>,
	phase: SyncPhase,
	last_change_at: Option<Instant>,
	inflight: Option<InFlightInfo>,
}

impl Default for DocSyncState {
	fn default() -> Self {
		Self::new()
	}
}

impl DocSyncState {
	/// Creates an idle state.
	pub fn new() -> Self {
		Self {
			pending: BTreeMap::new(),
			phase: SyncPhase::Idle,
			last_change_at: None,
			inflight: None,
		}
	}

	/// Creates a disabled state for a document that is not in scope.
	pub fn disabled() -> Self {
		Self {
			phase: SyncPhase::Disabled,
			..Self::new()
		}
	}

	/// Returns the current phase.
	pub fn phase(&self) -> SyncPhase {
		self.phase
	}

	/// Returns the number of pending corrections.
	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}

	/// Returns pending corrections in ascending line order.
	pub fn pending(&self) -> impl Iterator<Item = &PendingCorrection> {
		self.pending.values()
	}

	/// Returns the in-flight commit, if any.
	pub fn inflight(&self) -> Option<&InFlightInfo> {
		self.inflight.as_ref()
	}

	/// Returns true if a commit is in flight.
	pub fn is_in_flight(&self) -> bool {
		self.inflight.is_some()
	}

	/// Merges a classified batch into the queue.
	///
	/// Queued lines are first moved across the batch's line shifts; lines the
	/// batch deleted lose their correction. New corrections then replace any
	/// queued entry for the same line. Restarts the coalescing window.
	///
	/// Returns false when the state is disabled and the batch was ignored.
	pub fn record(&mut self, now: Instant, classification: Classification) -> bool {
		if self.phase == SyncPhase::Disabled {
			return false;
		}

		if classification.shifts.iter().any(|shift| !shift.is_neutral()) && !self.pending.is_empty() {
			let queued = std::mem::take(&mut self.pending);
			for (_, mut correction) in queued {
				let moved = classification
					.shifts
					.iter()
					.try_fold(correction.line, |line, shift| remap_line(line, shift));
				match moved {
					Some(line) => {
						correction.line = line;
						self.pending.insert(line, correction);
					}
					None => trace!(line = correction.line, "seqline.sync.correction_dropped"),
				}
			}
		}

		for correction in classification.corrections {
			self.pending.insert(correction.line, correction);
		}
		self.touch(now);
		true
	}

	/// Queues a single correction, replacing any entry for the same line.
	///
	/// Returns false when the state is disabled.
	pub fn schedule(&mut self, now: Instant, correction: PendingCorrection) -> bool {
		if self.phase == SyncPhase::Disabled {
			return false;
		}
		self.pending.insert(correction.line, correction);
		self.touch(now);
		true
	}

	fn touch(&mut self, now: Instant) {
		self.last_change_at = Some(now);
		if self.phase == SyncPhase::Idle && !self.pending.is_empty() {
			self.phase = SyncPhase::Collecting;
		}
	}

	/// Returns true if a commit should start now.
	///
	/// Due once the queue has been quiet for `window`, or immediately once it
	/// holds `max_pending` corrections. Never due while a commit is in flight.
	pub fn is_due(&self, now: Instant, window: Duration, max_pending: usize) -> bool {
		if self.phase != SyncPhase::Collecting || self.inflight.is_some() || self.pending.is_empty() {
			return false;
		}
		if self.pending.len() >= max_pending {
			return true;
		}
		self.last_change_at
			.is_some_and(|at| now.saturating_duration_since(at) >= window)
	}

	/// Returns when the queue becomes due, assuming no further changes.
	///
	/// A full queue is due at its last change.
	pub fn deadline(&self, window: Duration, max_pending: usize) -> Option<Instant> {
		if self.phase != SyncPhase::Collecting || self.inflight.is_some() || self.pending.is_empty() {
			return None;
		}
		let at = self.last_change_at?;
		Some(if self.pending.len() >= max_pending { at } else { at + window })
	}

	/// Takes every pending correction and marks the commit in flight.
	pub fn take_for_commit(&mut self, now: Instant, generation: u64) -> CommitBatch {
		let mut corrections: Vec<PendingCorrection> = std::mem::take(&mut self.pending).into_values().collect();
		corrections.reverse();
		self.phase = SyncPhase::Committing;
		self.inflight = Some(InFlightInfo {
			generation,
			started_at: now,
		});
		CommitBatch {
			generation,
			corrections,
		}
	}

	/// Settles the in-flight commit.
	///
	/// Returns false for a completion that does not match the in-flight
	/// generation; such completions change nothing.
	pub fn mark_complete(&mut self, generation: u64, result: CommitResult) -> bool {
		match self.inflight {
			Some(info) if info.generation == generation => {}
			other => {
				warn!(
					generation,
					inflight = other.map(|info| info.generation),
					"seqline.sync.stale_completion"
				);
				return false;
			}
		}
		self.inflight = None;

		if self.phase != SyncPhase::Disabled {
			self.phase = if self.pending.is_empty() {
				SyncPhase::Idle
			} else {
				SyncPhase::Collecting
			};
		}
		trace!(generation, ?result, phase = ?self.phase, "seqline.sync.commit_settled");
		true
	}

	/// Drops the queue and enters [`SyncPhase::Disabled`].
	///
	/// An in-flight commit stays tracked so its completion still clears the
	/// flag.
	pub fn disable(&mut self) {
		self.pending.clear();
		self.last_change_at = None;
		self.phase = SyncPhase::Disabled;
	}

	/// Leaves [`SyncPhase::Disabled`], starting fresh.
	///
	/// While an earlier commit is still in flight the phase stays
	/// [`SyncPhase::Committing`] until it settles.
	pub fn enable(&mut self) {
		if self.phase != SyncPhase::Disabled {
			return;
		}
		self.phase = if self.inflight.is_some() {
			SyncPhase::Committing
		} else {
			SyncPhase::Idle
		};
	}
}
