use clap::{CommandFactory, FromArgMatches, Parser};

use super::{CliArgs, OutputFormat};

#[test]
fn command_definition_is_consistent() {
	CliArgs::command().debug_assert();
}

#[test]
fn parse_cli_accepts_default_arguments() {
	let command = CliArgs::command();
	let mut matches = command.get_matches_from(vec!["docfind", "notes.md"]);
	let parsed = CliArgs::from_arg_matches_mut(&mut matches).expect("parses");
	assert_eq!(parsed.output, OutputFormat::Plain);
	assert_eq!(parsed.steps, 0);
	assert_eq!(parsed.case_sensitive, None);
	assert!(!parsed.headless);
}

#[test]
fn option_flags_work_with_and_without_values() {
	let parsed = CliArgs::parse_from([
		"docfind",
		"notes.md",
		"--case-sensitive",
		"--whole-words",
		"off",
		"-q",
		"fox",
	]);
	assert_eq!(parsed.case_sensitive, Some(true));
	assert_eq!(parsed.whole_words, Some(false));
	assert_eq!(parsed.query.as_deref(), Some("fox"));
}

#[test]
fn config_files_accumulate() {
	let parsed = CliArgs::parse_from(["docfind", "doc.json", "-c", "a.toml", "--config", "b.toml"]);
	assert_eq!(parsed.config.len(), 2);
}
