use std::fmt;

#[derive(Debug, Clone)]
pub(crate) enum SettingSource {
	CliFlag(&'static str),
	Environment(&'static str),
	ConfigKey(&'static str),
}

impl fmt::Display for SettingSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::CliFlag(flag) => write!(f, "CLI flag `{flag}`"),
			Self::Environment(var) => write!(f, "environment variable `{var}`"),
			Self::ConfigKey(key) => write!(f, "configuration key `{key}`"),
		}
	}
}

/// Where the validated settings came from, for error messages.
#[derive(Debug, Default, Clone)]
pub(crate) struct ConfigSources {
	pub(crate) chunk_size: Option<SettingSource>,
	pub(crate) min_term_chars: Option<SettingSource>,
	pub(crate) tick_ms: Option<SettingSource>,
}

impl ConfigSources {
	pub(crate) fn source_for_chunk_size(&self) -> SettingSource {
		self.chunk_size
			.clone()
			.unwrap_or(SettingSource::ConfigKey("search.chunk_size"))
	}

	pub(crate) fn source_for_min_term_chars(&self) -> SettingSource {
		self.min_term_chars
			.clone()
			.unwrap_or(SettingSource::ConfigKey("search.min_term_chars"))
	}

	pub(crate) fn source_for_tick(&self) -> SettingSource {
		self.tick_ms
			.clone()
			.unwrap_or(SettingSource::ConfigKey("viewer.tick_ms"))
	}
}
