use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Terms shorter than this many characters never start a search.
pub const MIN_TERM_CHARS: usize = 2;

/// User-facing token that matches any run of characters.
pub const WILDCARD: char = '*';

const WILDCARD_EXPANSION: &str = ".*";
const WORD_BOUNDARY: &str = r"\b";

/// Options that change how a term is matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
	pub case_sensitive: bool,
	pub whole_words: bool,
}

/// A trimmed search term together with its match options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Query {
	term: String,
	options: MatchOptions,
}

impl Query {
	/// Build a query from raw user input. Surrounding whitespace is dropped.
	pub fn new(raw: &str, options: MatchOptions) -> Self {
		Self {
			term: raw.trim().to_owned(),
			options,
		}
	}

	#[must_use]
	pub fn term(&self) -> &str {
		&self.term
	}

	#[must_use]
	pub fn options(&self) -> MatchOptions {
		self.options
	}

	/// Same term under different options.
	#[must_use]
	pub fn with_options(&self, options: MatchOptions) -> Self {
		Self {
			term: self.term.clone(),
			options,
		}
	}

	/// Length of the term in characters.
	#[must_use]
	pub fn char_len(&self) -> usize {
		self.term.chars().count()
	}

	/// Whether the term is long enough to be searched for.
	#[must_use]
	pub fn is_searchable(&self, min_chars: usize) -> bool {
		self.char_len() >= min_chars.max(1)
	}
}

/// Matcher derived deterministically from a [`Query`].
#[derive(Clone, Debug)]
pub struct CompiledPattern {
	regex: Option<Regex>,
	source: String,
}

impl CompiledPattern {
	/// Compile a query. Never fails: an empty term, or a pattern the regex
	/// engine refuses, yields a matcher that matches nothing.
	pub fn compile(query: &Query) -> Self {
		if query.term().is_empty() {
			return Self::nothing();
		}
		let source = translate(query.term(), query.options().whole_words);
		match RegexBuilder::new(&source)
			.case_insensitive(!query.options().case_sensitive)
			.build()
		{
			Ok(regex) => Self {
				regex: Some(regex),
				source,
			},
			Err(error) => {
				tracing::warn!(term = query.term(), %error, "search pattern rejected; matching nothing");
				Self {
					regex: None,
					source,
				}
			}
		}
	}

	/// Matcher that never reports a match.
	#[must_use]
	pub fn nothing() -> Self {
		Self {
			regex: None,
			source: String::new(),
		}
	}

	/// Byte range of the first non-empty match in `text`.
	#[must_use]
	pub fn find(&self, text: &str) -> Option<Range<usize>> {
		self.regex
			.as_ref()?
			.find_iter(text)
			.find(|found| !found.is_empty())
			.map(|found| found.range())
	}

	#[must_use]
	pub fn is_match(&self, text: &str) -> bool {
		self.find(text).is_some()
	}

	#[must_use]
	pub fn matches_nothing(&self) -> bool {
		self.regex.is_none()
	}

	/// Regular expression the query was translated into.
	#[must_use]
	pub fn source(&self) -> &str {
		&self.source
	}
}

/// Translate a user term into regex syntax: literal segments are escaped,
/// wildcards expand to `.*`, and whole-word mode anchors every side that is
/// not already open-ended.
fn translate(term: &str, whole_words: bool) -> String {
	let mut pattern = term
		.split(WILDCARD)
		.map(regex::escape)
		.collect::<Vec<_>>()
		.join(WILDCARD_EXPANSION);

	if whole_words {
		pattern = match pattern.strip_prefix(WILDCARD_EXPANSION) {
			Some(rest) => rest.to_owned(),
			None => format!("{WORD_BOUNDARY}{pattern}"),
		};
		pattern = match pattern.strip_suffix(WILDCARD_EXPANSION) {
			Some(rest) => rest.to_owned(),
			None => format!("{pattern}{WORD_BOUNDARY}"),
		};
	}
	pattern
}
