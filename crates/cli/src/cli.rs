use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "seqline")]
#[command(about = "Inspect and repair sequence/date prefixed source files")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to $XDG_CONFIG_HOME/seqline/config.toml)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print a gutter view: date label, then the text without prefix
	Annotate {
		/// File to read.
		file: PathBuf,
	},
	/// Print the text without prefixes
	Strip {
		/// File to read.
		file: PathBuf,
	},
	/// Renumber sequences and repair invalid dates
	Resync {
		/// File to resync.
		file: PathBuf,

		/// Write the result back instead of printing it
		#[arg(long, short = 'w')]
		write: bool,
	},
	/// Report eligibility and lines with invalid date fields
	Check {
		/// File to check.
		file: PathBuf,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_resync_write() {
		let cli = Cli::try_parse_from(["seqline", "resync", "a.rpgle", "--write"]).unwrap();
		assert!(matches!(cli.command, Command::Resync { write: true, .. }));
		assert!(!cli.verbose);
	}

	#[test]
	fn test_global_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["seqline", "check", "a.rpgle", "-v", "--config", "c.toml"]).unwrap();
		assert!(cli.verbose);
		assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
	}

	#[test]
	fn test_subcommand_required() {
		assert!(Cli::try_parse_from(["seqline"]).is_err());
	}
}
