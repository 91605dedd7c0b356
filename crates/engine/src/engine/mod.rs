//! The synchronization reactor.
//!
//! [`SyncEngine`] owns one session per open document and drives it through
//! classification, coalescing and commit. It is single-threaded: events,
//! commit completions and coalescing deadlines are handled one at a time,
//! either by calling the methods directly or through [`SyncEngine::run`].
//!
//! Commits run as spawned tasks. Each reports a completion over a channel;
//! a drop guard reports failure if the task dies, so a document's in-flight
//! flag always clears. Closing a document or taking it out of scope cancels
//! its session token, which suppresses the annotation refresh of a commit
//! still in flight.

mod session;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use chrono::NaiveDate;
use seqline_primitives::Selection;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use self::session::{ExpectedEcho, Session};
use crate::annotate::compute_annotations;
use crate::apply::plan_edits;
use crate::classify::{PendingCorrection, classify};
use crate::commands::{self, Command, CommandOutcome, LineEdits};
use crate::config::Config;
use crate::error::CommandError;
use crate::host::{AnnotationSink, BufferHost, ChangeBatch, Clipboard, DocumentEdit, DocumentId, DocumentInfo};
use crate::scope::ScopeFilter;
use crate::sync::{CommitResult, SyncPhase};


/// Source of the current date.
pub type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Returns the local calendar date.
pub fn system_today() -> NaiveDate {
	chrono::Local::now().date_naive()
}

/// Reply channel of a command event.
pub type CommandReply = oneshot::Sender<Result<Option<CommandOutcome>, CommandError>>;

/// Host notifications consumed by [`SyncEngine::run`].
#[derive(Debug)]
pub enum EngineEvent {
	/// A document was opened.
	Opened(DocumentInfo),
	/// A document was closed.
	Closed(DocumentId),
	/// A document was mutated.
	Changed(ChangeBatch),
	/// The visible line ranges of a document changed.
	VisibleRanges {
		/// Document.
		doc: DocumentId,
		/// Half-open line ranges.
		ranges: Vec<Range<usize>>,
	},
	/// The active document changed.
	ActiveChanged(Option<DocumentId>),
	/// The configuration changed.
	ConfigChanged(Config),
	/// A document got a new URI, e.g. an untitled buffer was saved.
	Renamed {
		/// Document.
		doc: DocumentId,
		/// New URI.
		uri: Url,
	},
	/// A user command.
	Command {
		/// Target document.
		doc: DocumentId,
		/// Command to run.
		command: Command,
		/// Selection at invocation time.
		selection: Selection,
		/// Receives the outcome.
		reply: CommandReply,
	},
}

/// Completion message from spawned commit tasks.
#[derive(Debug)]
struct CommitComplete {
	doc: DocumentId,
	generation: u64,
	result: CommitResult,
}

/// Reports a failed completion unless the task reported one itself.
struct CompletionGuard {
	tx: mpsc::UnboundedSender<CommitComplete>,
	doc: DocumentId,
	generation: u64,
	sent: bool,
}

impl CompletionGuard {
	fn send(mut self, result: CommitResult) {
		self.sent = true;
		let _ = self.tx.send(CommitComplete {
			doc: self.doc,
			generation: self.generation,
			result,
		});
	}
}

impl Drop for CompletionGuard {
	fn drop(&mut self) {
		if !self.sent {
			let _ = self.tx.send(CommitComplete {
				doc: self.doc,
				generation: self.generation,
				result: CommitResult::Failed,
			});
		}
	}
}

/// Statistics from a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
	/// Commits spawned.
	pub committed: usize,
	/// Due batches that re-validated to nothing.
	pub skipped: usize,
	/// Due batches dropped because no snapshot was available.
	pub failed: usize,
}

/// Prefix synchronization reactor over host collaborators.
pub struct SyncEngine<H, A> {
	host: Arc<H>,
	sink: Arc<A>,
	clipboard: Arc<dyn Clipboard>,
	config: Config,
	scope: ScopeFilter,
	sessions: HashMap<DocumentId, Session>,
	active: Option<DocumentId>,
	today: DateSource,
	next_generation: u64,
	completion_tx: mpsc::UnboundedSender<CommitComplete>,
	completion_rx: mpsc::UnboundedReceiver<CommitComplete>,
}

impl<H, A> std::fmt::Debug for SyncEngine<H, A> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SyncEngine")
			.field("sessions", &self.sessions.len())
			.field("active", &self.active)
			.field("generation", &self.scope.snapshot().generation())
			.finish()
	}
}

impl<H, A> SyncEngine<H, A>
where
	H: BufferHost + 'static,
	A: AnnotationSink + 'static,
{
	/// Creates an engine reading the system date.
	pub fn new(host: Arc<H>, sink: Arc<A>, clipboard: Arc<dyn Clipboard>, config: Config) -> Self {
		let (completion_tx, completion_rx) = mpsc::unbounded_channel();
		Self {
			host,
			sink,
			clipboard,
			scope: ScopeFilter::new(&config),
			config,
			sessions: HashMap::new(),
			active: None,
			today: Arc::new(system_today),
			next_generation: 0,
			completion_tx,
			completion_rx,
		}
	}

	/// Replaces the date source.
	pub fn with_date_source(mut self, today: DateSource) -> Self {
		self.today = today;
		self
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns the active document.
	pub fn active(&self) -> Option<DocumentId> {
		self.active
	}

	/// Returns the sync phase of an open document.
	pub fn phase(&self, doc: DocumentId) -> Option<SyncPhase> {
		self.sessions.get(&doc).map(|s| s.sync.phase())
	}

	/// Returns the number of pending corrections of a document.
	pub fn pending_len(&self, doc: DocumentId) -> usize {
		self.sessions.get(&doc).map_or(0, |s| s.sync.pending_len())
	}

	/// Returns true if a commit is in flight for a document.
	pub fn is_in_flight(&self, doc: DocumentId) -> bool {
		self.sessions.get(&doc).is_some_and(|s| s.sync.is_in_flight())
	}

	/// Returns true if an open document is in scope.
	pub fn is_eligible(&self, doc: DocumentId) -> bool {
		self.sessions.get(&doc).is_some_and(|s| s.eligible)
	}

	/// Starts a session for a document.
	pub async fn open(&mut self, info: DocumentInfo) {
		let doc = info.id;
		let eligible = self.scope.is_eligible(doc, &info.uri);
		debug!(doc = doc.0, uri = %info.uri, eligible, "seqline.sync.doc_open");
		if let Some(previous) = self.sessions.insert(doc, Session::new(info, eligible)) {
			previous.cancel.cancel();
		}
		self.refresh(doc).await;
	}

	/// Ends a session. Pending corrections are dropped; a commit in flight
	/// finishes without refreshing annotations.
	pub async fn close(&mut self, doc: DocumentId) {
		let Some(mut session) = self.sessions.remove(&doc) else {
			return;
		};
		debug!(
			doc = doc.0,
			pending = session.sync.pending_len(),
			in_flight = session.sync.is_in_flight(),
			"seqline.sync.doc_close"
		);
		session.cancel.cancel();
		session.sync.disable();
		self.scope.forget(doc);
		if self.active == Some(doc) {
			self.active = None;
		}
		self.sink.clear(doc).await;
	}

	/// Records a change notification.
	///
	/// The batch is classified against the text it carries, falling back to
	/// the current buffer. Annotations are refreshed whenever lines moved.
	pub async fn on_change(&mut self, batch: ChangeBatch) {
		let doc = batch.doc;
		let Some(session) = self.sessions.get_mut(&doc) else {
			return;
		};
		if !session.eligible {
			return;
		}
		if session.take_echo(&batch) {
			trace!(doc = doc.0, version = batch.version, "seqline.sync.echo_ignored");
			return;
		}

		let text = match &batch.text {
			Some(text) => text.clone(),
			None => {
				let Some(snapshot) = self.host.snapshot(doc).await else {
					warn!(doc = doc.0, "seqline.sync.no_snapshot");
					return;
				};
				if snapshot.version != batch.version {
					warn!(
						doc = doc.0,
						batch_version = batch.version,
						snapshot_version = snapshot.version,
						"seqline.sync.snapshot_ahead"
					);
				}
				snapshot.text
			}
		};

		let classification = classify(text.slice(..), &batch.changes);
		let moved_lines = classification.shifts.iter().any(|shift| !shift.is_neutral());
		let queued = classification.corrections.len();
		let Some(session) = self.sessions.get_mut(&doc) else {
			return;
		};
		session.sync.record(Instant::now(), classification);
		trace!(
			doc = doc.0,
			version = batch.version,
			change_count = batch.changes.len(),
			queued,
			pending = session.sync.pending_len(),
			"seqline.sync.doc_edit"
		);

		if moved_lines {
			self.refresh(doc).await;
		}
	}

	/// Queues a correction directly. Returns false for unknown or
	/// out-of-scope documents.
	pub fn schedule(&mut self, doc: DocumentId, correction: PendingCorrection) -> bool {
		self.sessions
			.get_mut(&doc)
			.is_some_and(|session| session.eligible && session.sync.schedule(Instant::now(), correction))
	}

	/// Replaces the visible line ranges of a document and refreshes its
	/// annotations.
	pub async fn set_visible_ranges(&mut self, doc: DocumentId, ranges: Vec<Range<usize>>) {
		let Some(session) = self.sessions.get_mut(&doc) else {
			return;
		};
		session.visible = ranges;
		self.refresh(doc).await;
	}

	/// Marks a document active and refreshes its annotations.
	pub async fn set_active(&mut self, doc: Option<DocumentId>) {
		self.active = doc;
		if let Some(doc) = doc {
			self.refresh(doc).await;
		}
	}

	/// Installs a configuration and re-evaluates every session.
	pub async fn set_config(&mut self, config: Config) {
		let generation = self.scope.set_config(&config);
		self.config = config;
		debug!(generation, enabled = self.config.enabled, "seqline.sync.config_changed");

		let docs: Vec<DocumentId> = self.sessions.keys().copied().collect();
		for doc in docs {
			self.reevaluate(doc).await;
		}
	}

	/// Updates the URI of a document and re-evaluates its scope.
	pub async fn rename(&mut self, doc: DocumentId, uri: Url) {
		let Some(session) = self.sessions.get_mut(&doc) else {
			return;
		};
		debug!(doc = doc.0, from = %session.info.uri, to = %uri, "seqline.sync.doc_renamed");
		session.info.uri = uri;
		self.scope.forget(doc);
		self.reevaluate(doc).await;
	}

	async fn reevaluate(&mut self, doc: DocumentId) {
		let Some(session) = self.sessions.get_mut(&doc) else {
			return;
		};
		let eligible = self.scope.is_eligible(doc, &session.info.uri);
		if session.set_eligible(eligible) {
			debug!(doc = doc.0, eligible, "seqline.sync.scope_changed");
		}
		self.refresh(doc).await;
	}

	/// Recomputes annotations of a document, or clears them when it is out of
	/// scope.
	async fn refresh(&self, doc: DocumentId) {
		let Some(session) = self.sessions.get(&doc) else {
			return;
		};
		if session.eligible {
			refresh_annotations(&*self.host, &*self.sink, doc, &session.visible).await;
		} else {
			self.sink.clear(doc).await;
		}
	}

	/// Returns the earliest instant a pending batch becomes due.
	pub fn next_deadline(&self) -> Option<Instant> {
		let window = self.config.coalesce_window();
		self.sessions
			.values()
			.filter_map(|s| s.sync.deadline(window, self.config.max_pending_lines))
			.min()
	}

	fn poll_completions(&mut self) {
		while let Ok(complete) = self.completion_rx.try_recv() {
			self.settle_one(complete);
		}
	}

	fn settle_one(&mut self, complete: CommitComplete) {
		let Some(session) = self.sessions.get_mut(&complete.doc) else {
			trace!(doc = complete.doc.0, generation = complete.generation, "seqline.sync.completion_orphaned");
			return;
		};
		if session.sync.mark_complete(complete.generation, complete.result)
			&& complete.result == CommitResult::Failed
		{
			session.echoes.clear();
		}
	}

	/// Waits for every in-flight commit to settle.
	pub async fn settle(&mut self) {
		self.poll_completions();
		while self.sessions.values().any(|s| s.sync.is_in_flight()) {
			let Some(complete) = self.completion_rx.recv().await else {
				return;
			};
			self.settle_one(complete);
		}
	}

	/// Settles finished commits and starts every commit that is due.
	pub async fn tick(&mut self, now: Instant) -> TickStats {
		self.poll_completions();

		let window = self.config.coalesce_window();
		let max_pending = self.config.max_pending_lines;
		let due: Vec<DocumentId> = self
			.sessions
			.iter()
			.filter(|(_, s)| s.sync.is_due(now, window, max_pending))
			.map(|(&doc, _)| doc)
			.collect();

		let mut stats = TickStats::default();
		for doc in due {
			let snapshot = self.host.snapshot(doc).await;
			let today = (self.today)();
			let generation = self.next_generation;
			self.next_generation = self.next_generation.wrapping_add(1);

			let Some(session) = self.sessions.get_mut(&doc) else {
				continue;
			};
			let batch = session.sync.take_for_commit(now, generation);

			let Some(snapshot) = snapshot else {
				warn!(doc = doc.0, generation, "seqline.sync.no_snapshot");
				session.sync.mark_complete(generation, CommitResult::Failed);
				stats.failed += 1;
				continue;
			};

			let plan = plan_edits(snapshot.text.slice(..), &batch.corrections, today, self.config.new_line_date);
			if plan.is_empty() {
				trace!(doc = doc.0, generation, skipped = plan.skipped, "seqline.sync.commit_skipped");
				session.sync.mark_complete(generation, CommitResult::Skipped);
				stats.skipped += 1;
				continue;
			}

			debug!(
				doc = doc.0,
				generation,
				version = snapshot.version,
				edit_count = plan.edits.len(),
				skipped = plan.skipped,
				"seqline.sync.commit_start"
			);
			session.echoes.push(ExpectedEcho {
				version: snapshot.version + 1,
				edits: plan.edits.clone(),
			});

			let guard = CompletionGuard {
				tx: self.completion_tx.clone(),
				doc,
				generation,
				sent: false,
			};
			let host = Arc::clone(&self.host);
			let sink = Arc::clone(&self.sink);
			let cancel = session.cancel.clone();
			let visible = session.visible.clone();
			let edit = DocumentEdit {
				version: Some(snapshot.version),
				edits: plan.edits,
			};
			tokio::spawn(run_commit(host, sink, doc, edit, cancel, visible, guard));
			stats.committed += 1;
		}
		stats
	}

	/// Runs a user command against the current buffer.
	///
	/// Returns `Ok(None)` when the document is out of scope or the command
	/// has nothing to do.
	///
	/// # Errors
	///
	/// Returns [`CommandError`] when the document is not open or the host
	/// rejects the edit or clipboard write.
	pub async fn execute(
		&mut self,
		doc: DocumentId,
		command: Command,
		selection: &Selection,
	) -> Result<Option<CommandOutcome>, CommandError> {
		let session = self.sessions.get(&doc).ok_or(CommandError::NotOpen(doc))?;
		if !session.eligible {
			trace!(doc = doc.0, %command, "seqline.command.out_of_scope");
			return Ok(None);
		}
		let snapshot = self.host.snapshot(doc).await.ok_or(CommandError::NoBuffer(doc))?;
		let text = snapshot.text.slice(..);

		let planned: LineEdits = match command {
			Command::CopyWithoutPrefix => {
				let copied = commands::copy_without_prefix(text, selection);
				self.clipboard.write_text(&copied)?;
				debug!(doc = doc.0, %command, chars = copied.chars().count(), "seqline.command.done");
				return Ok(Some(CommandOutcome::new(commands::COPY_MESSAGE)));
			}
			Command::DeleteSelectedLines => commands::delete_selected_lines(text, selection),
			Command::ForceInsertPrefix => commands::force_insert_prefix(text, selection),
			Command::SetDateToZero => commands::set_date_to_zero(text, selection),
			Command::Resync => commands::resync(text, (self.today)()),
		};
		if planned.edits.is_empty() {
			trace!(doc = doc.0, %command, "seqline.command.nothing_to_do");
			return Ok(None);
		}

		if let Some(session) = self.sessions.get_mut(&doc) {
			session.echoes.push(ExpectedEcho {
				version: snapshot.version + 1,
				edits: planned.edits.clone(),
			});
		}
		let edit = DocumentEdit {
			version: Some(snapshot.version),
			edits: planned.edits.clone(),
		};
		if let Err(err) = self.host.apply(doc, edit).await {
			if let Some(session) = self.sessions.get_mut(&doc) {
				session.echoes.retain(|echo| echo.version != snapshot.version + 1);
			}
			return Err(err.into());
		}

		self.refresh(doc).await;
		let message = commands::outcome_message(command, &planned);
		debug!(doc = doc.0, %command, lines = planned.lines, "seqline.command.done");
		Ok(Some(CommandOutcome::new(message)))
	}

	/// Returns the commands offered for a selection.
	pub async fn actions(&self, doc: DocumentId, selection: &Selection) -> Vec<Command> {
		if !self.is_eligible(doc) {
			return Vec::new();
		}
		match self.host.snapshot(doc).await {
			Some(snapshot) => commands::available_actions(snapshot.text.slice(..), selection),
			None => Vec::new(),
		}
	}

	/// Returns the selection with multi-line starts moved out of the prefix,
	/// or `None` when nothing needs to move.
	pub async fn guard_selection(&self, doc: DocumentId, selection: &Selection) -> Option<Selection> {
		if !self.is_eligible(doc) {
			return None;
		}
		let snapshot = self.host.snapshot(doc).await?;
		commands::guard_selection(snapshot.text.slice(..), selection)
	}

	/// Handles one host event. Failures are logged, never propagated.
	pub async fn handle_event(&mut self, event: EngineEvent) {
		match event {
			EngineEvent::Opened(info) => self.open(info).await,
			EngineEvent::Closed(doc) => self.close(doc).await,
			EngineEvent::Changed(batch) => self.on_change(batch).await,
			EngineEvent::VisibleRanges { doc, ranges } => self.set_visible_ranges(doc, ranges).await,
			EngineEvent::ActiveChanged(doc) => self.set_active(doc).await,
			EngineEvent::ConfigChanged(config) => self.set_config(config).await,
			EngineEvent::Renamed { doc, uri } => self.rename(doc, uri).await,
			EngineEvent::Command {
				doc,
				command,
				selection,
				reply,
			} => {
				let result = self.execute(doc, command, &selection).await;
				if let Err(err) = &result {
					warn!(doc = doc.0, %command, error = %err, "seqline.command.failed");
				}
				let _ = reply.send(result);
			}
		}
	}

	/// Runs the reactor until `shutdown` fires or the event channel closes.
	pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<EngineEvent>, shutdown: CancellationToken) {
		debug!("seqline.sync.run_start");
		loop {
			let deadline = self.next_deadline();
			let wait = async move {
				match deadline {
					Some(at) => tokio::time::sleep_until(at).await,
					None => std::future::pending::<()>().await,
				}
			};

			tokio::select! {
				biased;
				() = shutdown.cancelled() => break,
				Some(complete) = self.completion_rx.recv() => self.settle_one(complete),
				event = events.recv() => match event {
					Some(event) => self.handle_event(event).await,
					None => break,
				},
				() = wait => {
					self.tick(Instant::now()).await;
				}
			}
		}
		debug!(sessions = self.sessions.len(), "seqline.sync.run_stop");
	}
}

async fn run_commit<H, A>(
	host: Arc<H>,
	sink: Arc<A>,
	doc: DocumentId,
	edit: DocumentEdit,
	cancel: CancellationToken,
	visible: Vec<Range<usize>>,
	guard: CompletionGuard,
) where
	H: BufferHost + ?Sized,
	A: AnnotationSink + ?Sized,
{
	let generation = guard.generation;
	let result = match host.apply(doc, edit).await {
		Ok(()) => {
			debug!(doc = doc.0, generation, "seqline.sync.commit_done");
			CommitResult::Applied
		}
		Err(err) => {
			warn!(doc = doc.0, generation, error = %err, "seqline.sync.commit_failed");
			CommitResult::Failed
		}
	};

	if result == CommitResult::Applied {
		if cancel.is_cancelled() {
			trace!(doc = doc.0, generation, "seqline.sync.refresh_skipped");
		} else {
			refresh_annotations(&*host, &*sink, doc, &visible).await;
		}
	}
	guard.send(result);
}

/// Replaces the annotation set of a document, clearing it on failure.
async fn refresh_annotations<H, A>(host: &H, sink: &A, doc: DocumentId, visible: &[Range<usize>])
where
	H: BufferHost + ?Sized,
	A: AnnotationSink + ?Sized,
{
	let Some(snapshot) = host.snapshot(doc).await else {
		sink.clear(doc).await;
		return;
	};
	let annotations = compute_annotations(snapshot.text.slice(..), visible);
	if let Err(err) = sink.set(doc, annotations).await {
		warn!(doc = doc.0, error = %err, "seqline.sync.annotations_failed");
		sink.clear(doc).await;
	}
}
