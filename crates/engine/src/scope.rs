//! Document eligibility.
//!
//! A document is in scope when the feature is enabled, its URI scheme is a
//! local file or an untitled buffer, it is not one of the host's reserved
//! object-browser views, and its file extension is in the configured
//! allow-list. Decisions are memoized per configuration generation.

use std::collections::HashMap;

use tracing::trace;
use url::Url;

use crate::config::Config;
use crate::host::DocumentId;

/// Schemes the engine acts on. Remote object-browser, member and
/// stream-file views use their own schemes and are rejected here.
const SUPPORTED_SCHEMES: &[&str] = &["file", "untitled"];

/// Path prefix of remote system views mounted into the file scheme.
const RESERVED_PATH_PREFIX: &str = "/IBMi/";

/// Normalized configuration the filter evaluates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
	enabled: bool,
	file_types: Vec<String>,
	generation: u64,
}

impl ScopeSnapshot {
	/// Captures the scope-relevant part of a configuration.
	pub fn new(config: &Config, generation: u64) -> Self {
		Self {
			enabled: config.enabled,
			file_types: config.normalized_file_types(),
			generation,
		}
	}

	/// Configuration generation this snapshot was taken at.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true if the feature is enabled.
	pub fn enabled(&self) -> bool {
		self.enabled
	}

	/// Evaluates a URI without memoization.
	pub fn evaluate(&self, uri: &Url) -> bool {
		if !self.enabled {
			return false;
		}
		if !SUPPORTED_SCHEMES.contains(&uri.scheme()) {
			return false;
		}
		if uri.path().starts_with(RESERVED_PATH_PREFIX) {
			return false;
		}
		extension(uri).is_some_and(|ext| self.file_types.iter().any(|allowed| allowed[1..] == ext))
	}
}

/// Returns the lower-cased extension of the URI's file name, without the dot.
///
/// Dotfiles such as `.rpgle` have no extension.
pub fn extension(uri: &Url) -> Option<String> {
	let name = uri.path().rsplit('/').next()?;
	let dot = name.rfind('.')?;
	if dot == 0 || dot + 1 == name.len() {
		return None;
	}
	Some(name[dot + 1..].to_ascii_lowercase())
}

/// Memoizing eligibility filter.
#[derive(Debug)]
pub struct ScopeFilter {
	snapshot: ScopeSnapshot,
	decisions: HashMap<DocumentId, (Url, bool)>,
}

impl ScopeFilter {
	/// Creates a filter at generation 0.
	pub fn new(config: &Config) -> Self {
		Self {
			snapshot: ScopeSnapshot::new(config, 0),
			decisions: HashMap::new(),
		}
	}

	/// Returns the current snapshot.
	pub fn snapshot(&self) -> &ScopeSnapshot {
		&self.snapshot
	}

	/// Installs a new configuration, bumping the generation and dropping
	/// every memoized decision.
	pub fn set_config(&mut self, config: &Config) -> u64 {
		let generation = self.snapshot.generation.wrapping_add(1);
		self.snapshot = ScopeSnapshot::new(config, generation);
		self.decisions.clear();
		trace!(generation, "seqline.scope.invalidated");
		generation
	}

	/// Decides whether a document is in scope.
	///
	/// The memo is keyed by document and checked against the URI, so a
	/// rename is re-evaluated even without an explicit [`Self::forget`].
	pub fn is_eligible(&mut self, doc: DocumentId, uri: &Url) -> bool {
		if let Some((cached_uri, eligible)) = self.decisions.get(&doc)
			&& cached_uri == uri
		{
			return *eligible;
		}
		let eligible = self.snapshot.evaluate(uri);
		self.decisions.insert(doc, (uri.clone(), eligible));
		eligible
	}

	/// Drops the memoized decision of a document.
	pub fn forget(&mut self, doc: DocumentId) {
		self.decisions.remove(&doc);
	}
}
