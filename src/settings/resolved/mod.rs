use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use docfind_core::SearchSettings;
use docfind_core::export::FlashTiming;

mod errors;
mod sources;
mod summary;
mod validation;

pub(crate) use errors::ConfigError;
pub(crate) use sources::{ConfigSources, SettingSource};

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
	pub document: PathBuf,
	pub search: SearchSettings,
	pub initial_query: Option<String>,
	pub title: Option<String>,
	pub show_toc: bool,
	pub flash: FlashTiming,
	pub tick: Duration,
	pub log_level: String,
}

impl ResolvedConfig {
	pub(super) fn validate(&self, sources: &ConfigSources) -> Result<(), ConfigError> {
		validation::validate(self, sources)
	}

	/// Print a human readable summary of the effective configuration.
	pub fn print_summary(&self) {
		for line in summary::summary_lines(self) {
			println!("{line}");
		}
	}
}

/// Absolute path of the document, which must be an existing file.
pub(super) fn resolve_document(path: &Path) -> Result<PathBuf> {
	let path = if path.is_relative() {
		env::current_dir()
			.context("failed to resolve current directory for document")?
			.join(path)
	} else {
		path.to_path_buf()
	};
	let path = fs::canonicalize(&path)
		.with_context(|| format!("failed to locate document {}", path.display()))?;
	let metadata = fs::metadata(&path)
		.with_context(|| format!("failed to inspect document {}", path.display()))?;
	ensure!(metadata.is_file(), "document must be a file: {}", path.display());
	Ok(path)
}
