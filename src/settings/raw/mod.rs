use std::env;

use anyhow::{Error, Result};
use serde::Deserialize;

use crate::cli::CliArgs;

use super::resolved::{ConfigSources, ResolvedConfig, SettingSource};

mod search;
mod viewer;

use search::SearchSection;
use viewer::ViewerSection;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
	search: SearchSection,
	viewer: ViewerSection,
	logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LoggingSection {
	level: Option<String>,
}

impl RawConfig {
	/// Apply CLI overrides on top of the raw configuration values.
	pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
		self.search.apply_cli_overrides(cli);
		self.viewer.apply_cli_overrides(cli);
		if let Some(level) = cli.log_level.clone() {
			self.logging.level = Some(level);
		}
	}

	/// Convert the raw configuration into a [`ResolvedConfig`], validating and
	/// filling defaults where required.
	pub(super) fn resolve(self, cli: &CliArgs) -> Result<ResolvedConfig> {
		let sources = ConfigSources {
			chunk_size: detect_source(
				cli.chunk_size.is_some(),
				self.search.chunk_size.is_some(),
				"DOCFIND__SEARCH__CHUNK_SIZE",
				"--chunk-size",
				"search.chunk_size",
			),
			min_term_chars: detect_source(
				false,
				self.search.min_term_chars.is_some(),
				"DOCFIND__SEARCH__MIN_TERM_CHARS",
				"",
				"search.min_term_chars",
			),
			tick_ms: detect_source(
				false,
				self.viewer.tick_ms.is_some(),
				"DOCFIND__VIEWER__TICK_MS",
				"",
				"viewer.tick_ms",
			),
		};

		let document = super::resolved::resolve_document(&cli.document)?;
		let search = self.search.finalize();
		let viewer = self.viewer.finalize();

		let config = ResolvedConfig {
			document,
			search,
			initial_query: viewer.initial_query,
			title: viewer.title,
			show_toc: viewer.show_toc,
			flash: viewer.flash,
			tick: viewer.tick,
			log_level: self
				.logging
				.level
				.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
		};

		config.validate(&sources).map_err(Error::new)?;

		Ok(config)
	}
}

fn detect_source(
	cli_present: bool,
	value_present: bool,
	env_var: &'static str,
	cli_flag: &'static str,
	key: &'static str,
) -> Option<SettingSource> {
	if !value_present {
		return None;
	}

	if cli_present {
		return Some(SettingSource::CliFlag(cli_flag));
	}

	if env::var_os(env_var).is_some() {
		return Some(SettingSource::Environment(env_var));
	}

	Some(SettingSource::ConfigKey(key))
}
