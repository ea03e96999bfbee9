mod cli;
mod settings;
mod workflow;

use anyhow::Result;
use cli::{CliArgs, OutputFormat, parse_cli, print_json, print_plain};
use docfind::ViewerSettings;
use docfind::logging::{self, LogTarget};
use settings::ResolvedConfig;
use workflow::SearchWorkflow;

fn main() -> Result<()> {
	let cli = parse_cli();
	let resolved = settings::load(&cli)?;

	if cli.print_config {
		resolved.print_summary();
	}

	if cli.headless {
		logging::initialize(&resolved.log_level, &LogTarget::Stderr)?;
		run_headless(&cli, &resolved)
	} else {
		logging::initialize(&resolved.log_level, &LogTarget::cache_file()?)?;
		run_viewer(resolved)
	}
}

/// Run the search without a terminal and print the report.
fn run_headless(cli: &CliArgs, settings: &ResolvedConfig) -> Result<()> {
	let workflow = SearchWorkflow::from_config(settings, cli.steps)?;
	let report = workflow.run()?;

	match cli.output {
		OutputFormat::Plain => print_plain(&report),
		OutputFormat::Json => print_json(&report)?,
	}

	Ok(())
}

fn run_viewer(settings: ResolvedConfig) -> Result<()> {
	let document = workflow::load_document(&settings.document)?;
	let title = settings.title.or_else(|| {
		settings
			.document
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
	});
	docfind::run(
		document,
		ViewerSettings {
			search: settings.search,
			flash: settings.flash,
			tick: settings.tick,
			initial_query: settings.initial_query,
			title,
			show_toc: settings.show_toc,
		},
	)
}
