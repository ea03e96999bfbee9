//! Headless search: run a session to completion without a terminal and
//! report what it highlighted.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use docfind_core::document::{Document, NodeId};
use docfind_core::export::SECTION_CLASS;
use docfind_core::search::MatchOptions;
use docfind_core::{Phase, SearchSession, SearchSettings};
use serde::Serialize;
use tokio::task::LocalSet;

use crate::settings::ResolvedConfig;

/// Load a document, choosing the parser from the file extension.
pub(crate) fn load_document(path: &Path) -> Result<Document> {
	let source = fs::read_to_string(path)
		.with_context(|| format!("failed to read document {}", path.display()))?;
	let is_json = path
		.extension()
		.is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
	let document = if is_json {
		Document::from_json(&source)
	} else {
		docfind_core::document::from_text(&source)
	};
	document.with_context(|| format!("failed to parse document {}", path.display()))
}

/// One highlighted match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MatchReport {
	/// 1-based position in document order.
	pub index: usize,
	pub text: String,
	/// Text of the block the match sits in, whitespace collapsed.
	pub context: String,
	/// Identifier of the enclosing content section.
	pub section: Option<String>,
	pub current: bool,
}

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SearchReport {
	pub document: String,
	pub query: String,
	pub options: MatchOptions,
	pub phase: Phase,
	pub counter: String,
	pub matches: Vec<MatchReport>,
}

/// Loads a document and runs one query over it.
pub(crate) struct SearchWorkflow {
	path: PathBuf,
	document: Document,
	settings: SearchSettings,
	query: String,
	steps: usize,
}

impl SearchWorkflow {
	pub(crate) fn from_config(config: &ResolvedConfig, steps: usize) -> Result<Self> {
		let document = load_document(&config.document)?;
		Ok(Self {
			path: config.document.clone(),
			document,
			settings: config.search,
			query: config.initial_query.clone().unwrap_or_default(),
			steps,
		})
	}

	pub(crate) fn run(self) -> Result<SearchReport> {
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()
			.context("failed to start the search runtime")?;
		LocalSet::new().block_on(&runtime, self.search())
	}

	async fn search(self) -> Result<SearchReport> {
		let root = self.document.root();
		let document = Rc::new(RefCell::new(self.document));
		let session = SearchSession::init(Rc::clone(&document), root, (), self.settings);
		let mut phase = session.subscribe();

		tracing::info!(query = %self.query, document = %self.path.display(), "headless search");
		session.input(&self.query);
		while phase.borrow_and_update().is_busy() {
			phase
				.changed()
				.await
				.context("search session stopped before settling")?;
		}

		for _ in 0..self.steps {
			session.next();
		}

		let current = session.current_marker();
		let matches = {
			let document = document.borrow();
			session
				.markers()
				.into_iter()
				.enumerate()
				.map(|(index, marker)| match_report(&document, index, marker, current == Some(marker)))
				.collect()
		};
		let snapshot = session.snapshot();

		Ok(SearchReport {
			document: self.path.display().to_string(),
			query: self.query,
			options: snapshot.options,
			phase: snapshot.phase,
			counter: session.counter(),
			matches,
		})
	}
}

fn match_report(document: &Document, index: usize, marker: NodeId, current: bool) -> MatchReport {
	let context = document
		.parent(marker)
		.map(|parent| collapse_whitespace(&document.text_content(parent)))
		.unwrap_or_default();
	let section = document
		.closest_with_class(marker, SECTION_CLASS)
		.and_then(|section| document.attr(section, "id"))
		.map(str::to_owned);
	MatchReport {
		index: index + 1,
		text: document.text_content(marker),
		context,
		section,
		current,
	}
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}
