//! Table of contents: section outline, active-section tracking while
//! scrolling and jumping to a section.

use serde::Serialize;

use crate::document::{Document, NodeId};
use crate::export::{SECTION_CLASS, section_title};

/// Fraction of the viewport height, from the top, at which sections become
/// active.
pub const ACTIVATION_RATIO: (usize, usize) = (2, 5);

/// Entry of the table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
	pub id: String,
	pub title: String,
}

/// Every content section that has an `id`, in document order.
#[must_use]
pub fn outline(document: &Document) -> Vec<TocEntry> {
	document
		.find_by_class(document.root(), SECTION_CLASS)
		.into_iter()
		.filter_map(|section| {
			let id = document.attr(section, "id")?.to_owned();
			Some(TocEntry {
				id,
				title: section_title(document, section),
			})
		})
		.collect()
}

/// Resolve a section for navigation, expanding it when it is a collapsed
/// `details` element.
pub fn open_section(document: &mut Document, id: &str) -> Option<NodeId> {
	let node = document.find_by_id(id)?;
	let collapsed = document
		.element(node)
		.is_some_and(|element| element.is("details") && !element.attrs.contains_key("open"));
	if collapsed {
		let _ = document.set_attr(node, "open", "");
	}
	Some(node)
}

/// Rows occupied by a rendered section; `end` is exclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSpan {
	pub id: String,
	pub start: usize,
	pub end: usize,
}

/// Tracks which sections cross the activation line of the viewport.
#[derive(Clone, Debug, Default)]
pub struct SectionTracker {
	spans: Vec<SectionSpan>,
	active: Vec<bool>,
}

impl SectionTracker {
	#[must_use]
	pub fn new(spans: Vec<SectionSpan>) -> Self {
		let active = vec![false; spans.len()];
		Self { spans, active }
	}

	/// Recompute the active sections for a viewport. Returns `true` when the
	/// active set changed.
	pub fn update(&mut self, scroll_top: usize, viewport_height: usize) -> bool {
		let (numerator, denominator) = ACTIVATION_RATIO;
		let line = scroll_top + viewport_height * numerator / denominator;
		let mut changed = false;
		for (span, active) in self.spans.iter().zip(self.active.iter_mut()) {
			let now = span.start <= line && line < span.end;
			changed |= now != *active;
			*active = now;
		}
		changed
	}

	#[must_use]
	pub fn is_active(&self, id: &str) -> bool {
		self.spans
			.iter()
			.zip(&self.active)
			.any(|(span, &active)| active && span.id == id)
	}

	/// Identifiers of the active sections.
	pub fn active(&self) -> impl Iterator<Item = &str> {
		self.spans
			.iter()
			.zip(&self.active)
			.filter(|&(_, &active)| active)
			.map(|(span, _)| span.id.as_str())
	}

	/// First row of a section, for scrolling to it.
	#[must_use]
	pub fn target(&self, id: &str) -> Option<usize> {
		self.spans.iter().find(|span| span.id == id).map(|span| span.start)
	}
}
