use std::time::Duration;

use docfind_core::SearchSettings;
use serde::Deserialize;

use crate::cli::CliArgs;

/// `[search]` values prior to validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchSection {
	pub(super) debounce_ms: Option<u64>,
	pub(super) chunk_size: Option<usize>,
	pub(super) chunk_pause_ms: Option<u64>,
	pub(super) min_term_chars: Option<usize>,
	pub(super) case_sensitive: Option<bool>,
	pub(super) whole_words: Option<bool>,
}

impl SearchSection {
	pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
		if let Some(value) = cli.debounce_ms {
			self.debounce_ms = Some(value);
		}
		if let Some(value) = cli.chunk_size {
			self.chunk_size = Some(value);
		}
		if let Some(value) = cli.case_sensitive {
			self.case_sensitive = Some(value);
		}
		if let Some(value) = cli.whole_words {
			self.whole_words = Some(value);
		}
	}

	pub(super) fn finalize(&self) -> SearchSettings {
		let defaults = SearchSettings::default();
		let mut options = defaults.options;
		if let Some(value) = self.case_sensitive {
			options.case_sensitive = value;
		}
		if let Some(value) = self.whole_words {
			options.whole_words = value;
		}
		SearchSettings {
			debounce: self
				.debounce_ms
				.map_or(defaults.debounce, Duration::from_millis),
			chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
			chunk_pause: self
				.chunk_pause_ms
				.map_or(defaults.chunk_pause, Duration::from_millis),
			min_term_chars: self.min_term_chars.unwrap_or(defaults.min_term_chars),
			options,
		}
	}
}
