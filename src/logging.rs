//! Tracing subscriber setup.
//!
//! The viewer owns the terminal, so its logs go to a file in the cache
//! directory. Headless runs log to stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::app_dirs;

/// Environment variable holding a filter directive that overrides the
/// configured level.
pub const LOG_ENV: &str = "DOCFIND_LOG";

const LOG_FILE: &str = "docfind.log";

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
	Stderr,
	File(PathBuf),
}

impl LogTarget {
	/// `docfind.log` inside the cache directory.
	pub fn cache_file() -> Result<Self> {
		Ok(Self::File(app_dirs::get_cache_dir()?.join(LOG_FILE)))
	}
}

/// Build the filter from `DOCFIND_LOG`, falling back to `level`.
pub fn filter(level: &str) -> Result<EnvFilter> {
	match EnvFilter::try_from_env(LOG_ENV) {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`")),
	}
}

/// Install the global subscriber.
pub fn initialize(level: &str, target: &LogTarget) -> Result<()> {
	let filter = filter(level)?;
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

	let installed = match target {
		LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
		LogTarget::File(path) => {
			if let Some(parent) = path.parent() {
				fs::create_dir_all(parent)
					.with_context(|| format!("failed to create log directory {}", parent.display()))?;
			}
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.with_context(|| format!("failed to open log file {}", path.display()))?;
			builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
		}
	};
	installed.map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn configured_level_is_used_without_override() {
		if std::env::var_os(LOG_ENV).is_some() {
			return;
		}
		assert_eq!(filter("debug").expect("filter").to_string(), "debug");
	}

	#[test]
	fn garbage_levels_are_rejected() {
		if std::env::var_os(LOG_ENV).is_some() {
			return;
		}
		assert!(filter("docfind=loud").is_err());
	}
}
