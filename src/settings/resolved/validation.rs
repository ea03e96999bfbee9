use super::{ConfigError, ConfigSources, ResolvedConfig};

pub(super) fn validate(config: &ResolvedConfig, sources: &ConfigSources) -> Result<(), ConfigError> {
	if config.search.chunk_size == 0 {
		return Err(ConfigError::invalid(
			"search.chunk_size",
			"0",
			sources.source_for_chunk_size(),
			"must be greater than zero",
		));
	}

	if config.search.min_term_chars == 0 {
		return Err(ConfigError::invalid(
			"search.min_term_chars",
			"0",
			sources.source_for_min_term_chars(),
			"must be at least 1",
		));
	}

	if config.tick.is_zero() {
		return Err(ConfigError::invalid(
			"viewer.tick_ms",
			"0",
			sources.source_for_tick(),
			"must be greater than zero",
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;
	use std::time::Duration;

	use docfind_core::SearchSettings;
	use docfind_core::export::FlashTiming;

	use super::super::SettingSource;
	use super::*;

	fn config(search: SearchSettings) -> ResolvedConfig {
		ResolvedConfig {
			document: PathBuf::from("/tmp/doc.md"),
			search,
			initial_query: None,
			title: None,
			show_toc: true,
			flash: FlashTiming::default(),
			tick: Duration::from_millis(16),
			log_level: "info".into(),
		}
	}

	#[test]
	fn validation_rejects_zero_chunk_size() {
		let config = config(SearchSettings {
			chunk_size: 0,
			..SearchSettings::default()
		});
		let sources = ConfigSources {
			chunk_size: Some(SettingSource::CliFlag("--chunk-size")),
			..ConfigSources::default()
		};

		let err = validate(&config, &sources).unwrap_err();
		assert_eq!(err.key, "search.chunk_size");
		let message = err.to_string();
		assert!(message.contains("value: 0"));
		assert!(message.contains("CLI flag"));
	}

	#[test]
	fn validation_rejects_zero_min_term_chars() {
		let config = config(SearchSettings {
			min_term_chars: 0,
			..SearchSettings::default()
		});
		let sources = ConfigSources {
			min_term_chars: Some(SettingSource::Environment("DOCFIND__SEARCH__MIN_TERM_CHARS")),
			..ConfigSources::default()
		};

		let err = validate(&config, &sources).unwrap_err();
		assert_eq!(err.key, "search.min_term_chars");
		assert!(err.to_string().contains("environment variable"));
	}

	#[test]
	fn defaults_are_valid() {
		assert!(validate(&config(SearchSettings::default()), &ConfigSources::default()).is_ok());
	}
}
