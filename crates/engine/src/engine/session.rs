use std::ops::Range;

use tokio_util::sync::CancellationToken;

use crate::host::{ChangeBatch, DocumentInfo, TextEdit};
use crate::sync::DocSyncState;

/// Edits the engine submitted, expected back through the change stream.
#[derive(Debug, Clone)]
pub(super) struct ExpectedEcho {
	pub(super) version: u64,
	pub(super) edits: Vec<TextEdit>,
}

impl ExpectedEcho {
	pub(super) fn matches(&self, batch: &ChangeBatch) -> bool {
		self.version == batch.version
			&& self.edits.len() == batch.changes.len()
			&& self
				.edits
				.iter()
				.zip(&batch.changes)
				.all(|(edit, change)| edit.range == change.range && edit.new_text == change.inserted_text)
	}
}

/// Per-document session state owned by the reactor.
#[derive(Debug)]
pub(super) struct Session {
	pub(super) info: DocumentInfo,
	pub(super) eligible: bool,
	pub(super) sync: DocSyncState,
	pub(super) visible: Vec<Range<usize>>,
	pub(super) cancel: CancellationToken,
	pub(super) echoes: Vec<ExpectedEcho>,
}

impl Session {
	pub(super) fn new(info: DocumentInfo, eligible: bool) -> Self {
		Self {
			info,
			eligible,
			sync: if eligible {
				DocSyncState::new()
			} else {
				DocSyncState::disabled()
			},
			visible: Vec::new(),
			cancel: CancellationToken::new(),
			echoes: Vec::new(),
		}
	}

	/// Consumes the expected echo for `batch`, if it is one.
	///
	/// Expectations at or below the batch version are dropped either way; a
	/// newer version means the document moved past them.
	pub(super) fn take_echo(&mut self, batch: &ChangeBatch) -> bool {
		let matched = self.echoes.iter().any(|echo| echo.matches(batch));
		self.echoes.retain(|echo| echo.version > batch.version);
		matched
	}

	/// Enters or leaves scope. Returns true if eligibility changed.
	pub(super) fn set_eligible(&mut self, eligible: bool) -> bool {
		if self.eligible == eligible {
			return false;
		}
		self.eligible = eligible;
		if eligible {
			self.cancel = CancellationToken::new();
			self.sync.enable();
		} else {
			self.cancel.cancel();
			self.sync.disable();
			self.echoes.clear();
		}
		true
	}
}
