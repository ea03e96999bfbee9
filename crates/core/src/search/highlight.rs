//! Materialized highlight markers and their lossless removal.

use std::collections::HashSet;
use std::ops::Range;

use thiserror::Error;

use super::scanner::TextLeaf;
use crate::document::{Document, Element, NodeId, TreeError};

/// Class carried by every highlight wrapper.
pub const HIGHLIGHT_CLASS: &str = "search-highlight";

/// Extra class carried by the wrapper of the current marker.
pub const CURRENT_CLASS: &str = "current";

/// Tag of the highlight wrapper element.
const WRAPPER_TAG: &str = "span";

/// Errors raised when a leaf cannot be highlighted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
	#[error("text leaf {0:?} was already highlighted")]
	LeafConsumed(NodeId),

	#[error("text leaf {0:?} changed since it was enumerated")]
	StaleLeaf(NodeId),

	#[error("match range {start}..{end} does not fit a leaf of {len} bytes")]
	InvalidRange { start: usize, end: usize, len: usize },

	#[error(transparent)]
	Tree(#[from] TreeError),
}

/// One highlighted occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchMarker {
	wrapper: NodeId,
	leaf: NodeId,
	parent: NodeId,
	before: Option<NodeId>,
	after: Option<NodeId>,
	text: String,
	current: bool,
}

impl MatchMarker {
	/// Element wrapping the matched text.
	#[must_use]
	pub fn wrapper(&self) -> NodeId {
		self.wrapper
	}

	/// Element that owned the highlighted leaf.
	#[must_use]
	pub fn parent(&self) -> NodeId {
		self.parent
	}

	/// Matched substring.
	#[must_use]
	pub fn text(&self) -> &str {
		&self.text
	}

	#[must_use]
	pub fn is_current(&self) -> bool {
		self.current
	}

	/// Nodes spliced into the tree in place of the leaf, in order.
	fn produced(&self) -> Vec<NodeId> {
		self.before
			.into_iter()
			.chain(Some(self.wrapper))
			.chain(self.after)
			.collect()
	}
}

/// Owner of every highlight mutation applied to the document, in document
/// order.
#[derive(Debug, Default)]
pub struct HighlightStore {
	markers: Vec<MatchMarker>,
	consumed: HashSet<NodeId>,
}

impl HighlightStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn markers(&self) -> &[MatchMarker] {
		&self.markers
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&MatchMarker> {
		self.markers.get(index)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.markers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.markers.is_empty()
	}

	/// Split `leaf` into before/match/after and wrap the match.
	///
	/// Each leaf can be materialized once; the new marker is appended and its
	/// index returned.
	pub fn materialize(
		&mut self,
		document: &mut Document,
		leaf: &TextLeaf,
		range: Range<usize>,
	) -> Result<usize, HighlightError> {
		if self.consumed.contains(&leaf.node) {
			return Err(HighlightError::LeafConsumed(leaf.node));
		}
		if document.text(leaf.node) != Some(leaf.text.as_str())
			|| document.parent(leaf.node) != Some(leaf.parent)
		{
			return Err(HighlightError::StaleLeaf(leaf.node));
		}
		let text = leaf.text.as_str();
		if range.start >= range.end
			|| range.end > text.len()
			|| !text.is_char_boundary(range.start)
			|| !text.is_char_boundary(range.end)
		{
			return Err(HighlightError::InvalidRange {
				start: range.start,
				end: range.end,
				len: text.len(),
			});
		}

		let before = (range.start > 0).then(|| document.create_text(&text[..range.start]));
		let wrapper = document.create_element(Element::new(WRAPPER_TAG).with_class(HIGHLIGHT_CLASS));
		let matched = document.create_text(&text[range.clone()]);
		document.append_child(wrapper, matched)?;
		let after = (range.end < text.len()).then(|| document.create_text(&text[range.end..]));

		let marker = MatchMarker {
			wrapper,
			leaf: leaf.node,
			parent: leaf.parent,
			before,
			after,
			text: text[range].to_owned(),
			current: false,
		};
		if let Err(error) = document.replace_child(leaf.parent, leaf.node, &marker.produced()) {
			for node in marker.produced() {
				let _ = document.discard(node);
			}
			return Err(error.into());
		}

		self.consumed.insert(leaf.node);
		self.markers.push(marker);
		Ok(self.markers.len() - 1)
	}

	/// Toggle the current flag of a marker and its wrapper class.
	pub fn set_current(&mut self, document: &mut Document, index: usize, current: bool) -> bool {
		let Some(marker) = self.markers.get_mut(index) else {
			return false;
		};
		marker.current = current;
		if current {
			document.add_class(marker.wrapper, CURRENT_CLASS);
		} else {
			document.remove_class(marker.wrapper, CURRENT_CLASS);
		}
		true
	}

	/// Undo every highlight and clear the marker set. Returns the number of
	/// markers removed.
	///
	/// Markers whose spliced runs are still in place get their original leaf
	/// back. Anything else has its wrapper flattened to plain text, after which
	/// the parent is normalized.
	pub fn restore_all(&mut self, document: &mut Document) -> usize {
		let markers = std::mem::take(&mut self.markers);
		self.consumed.clear();
		let count = markers.len();

		for marker in markers.iter().rev() {
			if !restore_leaf(document, marker) {
				tracing::debug!(wrapper = ?marker.wrapper, "highlight disturbed; flattening wrapper");
				flatten_wrapper(document, marker);
			}
		}
		count
	}
}

fn restore_leaf(document: &mut Document, marker: &MatchMarker) -> bool {
	let produced = marker.produced();
	let children = document.children(marker.parent);
	let Some(start) = children.iter().position(|&child| child == produced[0]) else {
		return false;
	};
	let in_place = children.get(start..start + produced.len()) == Some(produced.as_slice());
	if !in_place
		|| document.text_content(marker.wrapper) != marker.text
		|| document.parent(marker.leaf).is_some()
	{
		return false;
	}

	if document
		.replace_child(marker.parent, produced[0], &[marker.leaf])
		.is_err()
	{
		return false;
	}
	for &node in &produced[1..] {
		log_cleanup(node, "detach", document.remove_child(marker.parent, node));
	}
	for node in produced {
		log_cleanup(node, "discard", document.discard(node));
	}
	true
}

fn flatten_wrapper(document: &mut Document, marker: &MatchMarker) {
	if let Some(parent) = document.parent(marker.wrapper) {
		let text = document.text_content(marker.wrapper);
		let replacement = document.create_text(text);
		if document
			.replace_child(parent, marker.wrapper, &[replacement])
			.is_ok()
		{
			log_cleanup(marker.wrapper, "discard", document.discard(marker.wrapper));
		}
		document.normalize(parent);
	}
	if document.contains(marker.leaf) && document.parent(marker.leaf).is_none() {
		log_cleanup(marker.leaf, "discard", document.discard(marker.leaf));
	}
}

/// Record a failed cleanup step; the node stays in the arena.
fn log_cleanup(node: NodeId, step: &'static str, result: Result<(), TreeError>) -> bool {
	match result {
		Ok(()) => true,
		Err(error) => {
			tracing::debug!(?node, step, %error, "highlight cleanup skipped");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::search::pattern::{CompiledPattern, MatchOptions, Query};
	use crate::search::scanner::text_leaves;

	fn document_with(paragraphs: &[&[&str]]) -> Document {
		let mut document = Document::new("main");
		let root = document.root();
		for runs in paragraphs {
			let p = document.create_element(Element::new("p"));
			document.append_child(root, p).expect("append p");
			for run in *runs {
				let text = document.create_text(*run);
				document.append_child(p, text).expect("append text");
			}
		}
		document
	}

	fn highlight_all(document: &mut Document, store: &mut HighlightStore, term: &str) {
		let pattern = CompiledPattern::compile(&Query::new(term, MatchOptions::default()));
		let leaves: Vec<_> = text_leaves(document, document.root()).collect();
		for leaf in leaves {
			if let Some(range) = pattern.find(&leaf.text) {
				store.materialize(document, &leaf, range).expect("materialize");
			}
		}
	}

	#[test]
	fn splits_leaf_around_match() {
		let mut document = document_with(&[&["The quick fox jumps"]]);
		let mut store = HighlightStore::new();
		highlight_all(&mut document, &mut store, "fox");

		assert_eq!(store.len(), 1);
		assert_eq!(store.markers()[0].text(), "fox");
		insta::assert_snapshot!(document.to_markup(document.root()), @r#"<main><p>The quick <span class="search-highlight">fox</span> jumps</p></main>"#);
	}

	#[test]
	fn match_at_edges_omits_empty_runs() {
		let mut document = document_with(&[&["fox"]]);
		let mut store = HighlightStore::new();
		highlight_all(&mut document, &mut store, "fox");
		let p = document.children(document.root())[0];
		assert_eq!(document.children(p), &[store.markers()[0].wrapper()]);
	}

	#[test]
	fn leaf_is_consumed_once() {
		let mut document = document_with(&[&["fox fox"]]);
		let leaf = text_leaves(&document, document.root()).next().expect("leaf");
		let mut store = HighlightStore::new();
		store.materialize(&mut document, &leaf, 0..3).expect("first");
		assert_eq!(
			store.materialize(&mut document, &leaf, 4..7),
			Err(HighlightError::LeafConsumed(leaf.node))
		);
	}

	#[test]
	fn rejects_ranges_outside_the_leaf() {
		let mut document = document_with(&[&["héllo"]]);
		let leaf = text_leaves(&document, document.root()).next().expect("leaf");
		let mut store = HighlightStore::new();
		assert!(matches!(
			store.materialize(&mut document, &leaf, 1..2),
			Err(HighlightError::InvalidRange { .. })
		));
		assert!(matches!(
			store.materialize(&mut document, &leaf, 3..3),
			Err(HighlightError::InvalidRange { .. })
		));
		assert!(store.is_empty());
	}

	#[test]
	fn restore_brings_back_original_nodes() {
		let mut document = document_with(&[&["a fox", "another fox"], &["none"]]);
		let before_markup = document.to_markup(document.root());
		let before_nodes: Vec<_> = document.descendants(document.root()).collect();
		let mut store = HighlightStore::new();
		highlight_all(&mut document, &mut store, "fox");
		assert_eq!(store.len(), 2);

		assert_eq!(store.restore_all(&mut document), 2);
		assert!(store.is_empty());
		assert_eq!(document.to_markup(document.root()), before_markup);
		assert_eq!(document.descendants(document.root()).collect::<Vec<_>>(), before_nodes);
	}

	#[test]
	fn restore_without_markers_is_a_no_op() {
		let mut document = document_with(&[&["plain"]]);
		let mut store = HighlightStore::new();
		assert_eq!(store.restore_all(&mut document), 0);
		assert_eq!(document.text_content(document.root()), "plain");
	}

	#[test]
	fn disturbed_markers_are_flattened() {
		let mut document = document_with(&[&["the fox den"]]);
		let mut store = HighlightStore::new();
		highlight_all(&mut document, &mut store, "fox");
		let p = document.children(document.root())[0];
		let intruder = document.create_text("!");
		document.append_child(p, intruder).expect("append");
		let first = document.children(p)[0];
		document.remove_child(p, first).expect("remove");
		document.discard(first).expect("discard");

		store.restore_all(&mut document);
		assert_eq!(document.children(p).len(), 1);
		assert_eq!(document.text_content(p), "fox den!");
		assert!(document.find_by_class(document.root(), HIGHLIGHT_CLASS).is_empty());
	}

	#[derive(Clone, Default)]
	struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

	impl std::io::Write for CapturedLog {
		fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
			self.0.lock().expect("log buffer").extend_from_slice(bytes);
			Ok(bytes.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn failed_cleanup_is_logged() {
		let mut document = document_with(&[&["still attached"]]);
		let p = document.children(document.root())[0];
		let leaf = document.children(p)[0];

		let log = CapturedLog::default();
		let writer = log.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::DEBUG)
			.with_ansi(false)
			.with_writer(move || writer.clone())
			.finish();
		let released = tracing::subscriber::with_default(subscriber, || {
			log_cleanup(leaf, "discard", document.discard(leaf))
		});

		assert!(!released);
		assert!(document.is_attached(leaf));
		let output = String::from_utf8(log.0.lock().expect("log buffer").clone()).expect("utf-8 log");
		assert!(output.contains("highlight cleanup skipped"), "{output}");
		assert!(output.contains("step=\"discard\""), "{output}");
	}

	#[test]
	fn current_flag_tracks_wrapper_class() {
		let mut document = document_with(&[&["fox"]]);
		let mut store = HighlightStore::new();
		highlight_all(&mut document, &mut store, "fox");
		let wrapper = store.markers()[0].wrapper();

		assert!(store.set_current(&mut document, 0, true));
		assert!(store.markers()[0].is_current());
		assert!(document.has_class(wrapper, CURRENT_CLASS));
		assert!(store.set_current(&mut document, 0, false));
		assert!(!document.has_class(wrapper, CURRENT_CLASS));
		assert!(!store.set_current(&mut document, 3, true));
	}

	proptest! {
		#[test]
		fn restore_round_trips_any_highlighting(
			paragraphs in prop::collection::vec(
				prop::collection::vec("[a-c ]{0,12}", 1..4),
				0..6,
			),
			term in "[a-c]{1,3}",
		) {
			let borrowed: Vec<Vec<&str>> = paragraphs
				.iter()
				.map(|runs| runs.iter().map(String::as_str).collect())
				.collect();
			let slices: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
			let mut document = document_with(&slices);
			let markup = document.to_markup(document.root());
			let count = document.node_count();

			let mut store = HighlightStore::new();
			highlight_all(&mut document, &mut store, &term);
			store.restore_all(&mut document);

			prop_assert_eq!(document.to_markup(document.root()), markup);
			prop_assert_eq!(document.node_count(), count);
		}
	}
}
