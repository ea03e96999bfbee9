use std::time::Duration;

use docfind_core::export::FlashTiming;
use serde::Deserialize;

use crate::cli::CliArgs;

const DEFAULT_TICK_MS: u64 = 16;

/// `[viewer]` values prior to validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct ViewerSection {
	pub(super) initial_query: Option<String>,
	pub(super) title: Option<String>,
	pub(super) show_toc: Option<bool>,
	pub(super) status_success_ms: Option<u64>,
	pub(super) status_error_ms: Option<u64>,
	pub(super) tick_ms: Option<u64>,
}

pub(super) struct ViewerResolution {
	pub(super) initial_query: Option<String>,
	pub(super) title: Option<String>,
	pub(super) show_toc: bool,
	pub(super) flash: FlashTiming,
	pub(super) tick: Duration,
}

impl ViewerSection {
	pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
		if let Some(query) = cli.query.clone() {
			self.initial_query = Some(query);
		}
	}

	pub(super) fn finalize(self) -> ViewerResolution {
		let defaults = FlashTiming::default();
		ViewerResolution {
			initial_query: self.initial_query.filter(|query| !query.trim().is_empty()),
			title: self.title.filter(|title| !title.is_empty()),
			show_toc: self.show_toc.unwrap_or(true),
			flash: FlashTiming {
				success: self
					.status_success_ms
					.map_or(defaults.success, Duration::from_millis),
				error: self
					.status_error_ms
					.map_or(defaults.error, Duration::from_millis),
			},
			tick: Duration::from_millis(self.tick_ms.unwrap_or(DEFAULT_TICK_MS)),
		}
	}
}
