//! Engine configuration.
//!
//! Loaded from TOML with camelCase keys; every key is optional:
//!
//! ```toml
//! enabled = true
//! enabledFileTypes = [".rpgle", ".sqlrpgle"]
//! newLineDate = "today"
//! coalesceWindowMs = 50
//! maxPendingLines = 256
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File types handled when no allow-list is configured.
pub const DEFAULT_FILE_TYPES: &[&str] = &[".rpgle", ".sqlrpgle", ".clle", ".dds", ".pf", ".lf"];

/// Default quiet period before a batched correction is committed.
pub const DEFAULT_COALESCE_WINDOW_MS: u64 = 50;

/// Default queue size that forces a commit without waiting for quiet.
pub const DEFAULT_MAX_PENDING_LINES: usize = 256;

/// Date written into the prefix of a newly created line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewLineDate {
	/// The current date.
	#[default]
	Today,
	/// The all-zero date field `000000`.
	Zero,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	/// Global kill switch.
	pub enabled: bool,
	/// File extensions in scope, e.g. `.rpgle`. Matched case-insensitively;
	/// entries without a leading dot are ignored.
	pub enabled_file_types: Vec<String>,
	/// Date policy for prefixes inserted on new lines.
	pub new_line_date: NewLineDate,
	/// Quiet period in milliseconds before pending corrections commit.
	pub coalesce_window_ms: u64,
	/// Queue size at which pending corrections commit immediately.
	pub max_pending_lines: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			enabled: true,
			enabled_file_types: DEFAULT_FILE_TYPES.iter().map(|s| (*s).to_string()).collect(),
			new_line_date: NewLineDate::default(),
			coalesce_window_ms: DEFAULT_COALESCE_WINDOW_MS,
			max_pending_lines: DEFAULT_MAX_PENDING_LINES,
		}
	}
}

impl Config {
	/// Parses a configuration from TOML text.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Parse`] if the text is not valid TOML or a key
	/// has the wrong type.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Reads and parses a configuration file.
	///
	/// # Errors
	///
	/// Returns [`ConfigError`] if the file cannot be read or parsed.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&text)
	}

	/// Returns the coalescing window as a [`Duration`].
	pub fn coalesce_window(&self) -> Duration {
		Duration::from_millis(self.coalesce_window_ms)
	}

	/// Returns the allow-list normalized to lower-cased `.ext` entries.
	pub fn normalized_file_types(&self) -> Vec<String> {
		let mut types: Vec<String> = self
			.enabled_file_types
			.iter()
			.map(|ext| ext.trim().to_ascii_lowercase())
			.filter(|ext| ext.len() > 1 && ext.starts_with('.'))
			.collect();
		types.sort();
		types.dedup();
		types
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert!(config.enabled);
		assert_eq!(config.enabled_file_types.len(), 6);
		assert_eq!(config.new_line_date, NewLineDate::Today);
		assert_eq!(config.coalesce_window(), Duration::from_millis(50));
	}

	#[test]
	fn test_empty_toml_uses_defaults() {
		assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
	}

	#[test]
	fn test_camel_case_keys() {
		let config = Config::from_toml_str(
			r#"
			enabled = false
			enabledFileTypes = [".CBL"]
			newLineDate = "zero"
			coalesceWindowMs = 20
			maxPendingLines = 8
			"#,
		)
		.unwrap();
		assert!(!config.enabled);
		assert_eq!(config.enabled_file_types, vec![".CBL".to_string()]);
		assert_eq!(config.new_line_date, NewLineDate::Zero);
		assert_eq!(config.coalesce_window_ms, 20);
		assert_eq!(config.max_pending_lines, 8);
	}

	#[test]
	fn test_wrong_type_is_rejected() {
		assert!(matches!(Config::from_toml_str("enabled = \"yes\""), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_normalization_drops_entries_without_dot() {
		let config = Config {
			enabled_file_types: vec![" .RPGLE ".into(), "clle".into(), ".".into(), ".rpgle".into(), ".Dds".into()],
			..Config::default()
		};
		assert_eq!(config.normalized_file_types(), vec![".dds".to_string(), ".rpgle".to_string()]);
	}

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "enabledFileTypes = [\".pf\"]").unwrap();
		let config = Config::load(file.path()).unwrap();
		assert_eq!(config.enabled_file_types, vec![".pf".to_string()]);
		assert!(config.enabled);
	}

	#[test]
	fn test_load_missing_file() {
		let err = Config::load(Path::new("/nonexistent/seqline.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Read { .. }));
	}
}
