//! Seqline command-line tools.
//!
//! Runs the prefix engine's pure passes over files on disk: a gutter view,
//! prefix stripping, explicit resync and a date-field check.

mod cli;
mod ops;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use cli::{Cli, Command};
use seqline_engine::{Config, system_today};
use tracing::{debug, info};
use url::Url;

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let config = load_config(cli.config.as_deref())?;

	match cli.command {
		Command::Annotate { file } => {
			let text = read(&file)?;
			print!("{}", ops::annotate(&text));
		}
		Command::Strip { file } => {
			let text = read(&file)?;
			print!("{}", ops::strip(&text)?);
		}
		Command::Resync { file, write } => {
			let text = read(&file)?;
			let (out, planned) = ops::resync(&text, system_today())?;
			if write {
				if !planned.edits.is_empty() {
					std::fs::write(&file, &out).with_context(|| format!("failed to write {}", file.display()))?;
				}
				eprintln!("{}", ops::resync_message(&planned));
			} else {
				print!("{out}");
			}
			info!(file = %file.display(), lines = planned.lines, write, "seqline.cli.resync");
		}
		Command::Check { file } => {
			let text = read(&file)?;
			let uri = file_url(&file)?;
			let report = ops::check(&text, &uri, &config);
			print!("{}", report.render(&file.display().to_string()));
			if !report.is_clean() {
				return Ok(ExitCode::FAILURE);
			}
		}
	}
	Ok(ExitCode::SUCCESS)
}

fn read(path: &Path) -> anyhow::Result<String> {
	std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_url(path: &Path) -> anyhow::Result<Url> {
	let absolute = std::path::absolute(path).with_context(|| format!("failed to resolve {}", path.display()))?;
	Url::from_file_path(&absolute).map_err(|()| anyhow!("not a file path: {}", absolute.display()))
}

fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("seqline").join("config.toml"))
}

/// Loads `explicit`, or the user config file when present, or defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
	if let Some(path) = explicit {
		return Config::load(path).with_context(|| format!("failed to load config {}", path.display()));
	}
	match default_config_path() {
		Some(path) if path.is_file() => {
			debug!(path = %path.display(), "seqline.cli.config");
			Config::load(&path).with_context(|| format!("failed to load config {}", path.display()))
		}
		_ => Ok(Config::default()),
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("SEQLINE_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("seqline=debug,seqline_engine=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}
