use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, ColorChoice, Parser};

use super::options::OutputFormat;
use super::styles::{cli_styles, long_version};

/// Command-line arguments accepted by the `docfind` binary.
#[derive(Parser, Debug)]
#[command(
	name = "docfind",
	version,
	long_version = long_version(),
	about = "Terminal document viewer with incremental in-document search",
	color = ColorChoice::Auto,
	styles = cli_styles()
)]
pub(crate) struct CliArgs {
	#[arg(
		value_name = "DOCUMENT",
		help = "Document to open: a JSON node tree (.json) or plain text with markdown-style headings"
	)]
	pub(crate) document: PathBuf,
	#[arg(
		short = 'q',
		long = "query",
		value_name = "QUERY",
		help = "Provide an initial search query (default: empty)"
	)]
	pub(crate) query: Option<String>,
	#[arg(
		long = "case-sensitive",
		value_parser = BoolishValueParser::new(),
		num_args = 0..=1,
		default_missing_value = "true",
		help = "Match letter case exactly (default: disabled)"
	)]
	pub(crate) case_sensitive: Option<bool>,
	#[arg(
		long = "whole-words",
		value_parser = BoolishValueParser::new(),
		num_args = 0..=1,
		default_missing_value = "true",
		help = "Only match whole words (default: disabled)"
	)]
	pub(crate) whole_words: Option<bool>,
	#[arg(
		long = "debounce-ms",
		value_name = "MS",
		help = "Quiet period after typing before a search starts (default: 300)"
	)]
	pub(crate) debounce_ms: Option<u64>,
	#[arg(
		long = "chunk-size",
		value_name = "NUM",
		help = "Text leaves examined per batch (default: 50)"
	)]
	pub(crate) chunk_size: Option<usize>,
	#[arg(
		short,
		long = "config",
		value_name = "FILE",
		env = "DOCFIND_CONFIG",
		action = ArgAction::Append,
		help = "Additional configuration file to merge (default: none)"
	)]
	pub(crate) config: Vec<PathBuf>,
	#[arg(
		short = 'n',
		long = "no-config",
		help = "Skip loading default configuration files (default: disabled)"
	)]
	pub(crate) no_config: bool,
	#[arg(
		short = 'p',
		long = "print-config",
		help = "Print the resolved configuration before running (default: disabled)"
	)]
	pub(crate) print_config: bool,
	#[arg(
		long = "headless",
		help = "Run the search without the viewer and print a report (default: disabled)"
	)]
	pub(crate) headless: bool,
	#[arg(
		long = "steps",
		value_name = "NUM",
		default_value_t = 0,
		help = "Move to the next match this many times after the search settles (headless only)"
	)]
	pub(crate) steps: usize,
	#[arg(
		short = 'o',
		long = "output",
		value_enum,
		default_value_t = OutputFormat::Plain,
		help = "Choose how to print the headless report"
	)]
	pub(crate) output: OutputFormat,
	#[arg(
		long = "log-level",
		value_name = "FILTER",
		help = "Log filter directive; DOCFIND_LOG takes precedence (default: info)"
	)]
	pub(crate) log_level: Option<String>,
}
