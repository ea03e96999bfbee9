//! Flatten the document tree into wrapped terminal rows.

use std::collections::HashMap;
use std::ops::Range;

use docfind_core::document::{Document, NodeId, NodeKind};
use docfind_core::export::{CODE_CONTAINER_CLASS, SECTION_CLASS};
use docfind_core::search::{CURRENT_CLASS, HIGHLIGHT_CLASS};
use docfind_core::toc::SectionSpan;
use unicode_width::UnicodeWidthStr;

const BLOCK_TAGS: [&str; 18] = [
	"article", "body", "details", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "main", "ol", "p",
	"pre", "section", "summary", "ul",
];
const SPACED_TAGS: [&str; 10] = ["h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "ul", "ol"];
const HIDDEN_TAGS: [&str; 2] = ["script", "style"];
const BULLET: &str = "• ";

/// Visual role of a run of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
	Plain,
	Heading,
	Code,
	Highlight,
	Current,
}

/// A styled run of text on one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
	pub text: String,
	pub tone: Tone,
	marker: Option<NodeId>,
}

/// Rows of the rendered document plus lookups into them.
#[derive(Debug, Default)]
pub struct Layout {
	pub lines: Vec<Vec<Segment>>,
	anchors: HashMap<NodeId, usize>,
	pub sections: Vec<SectionSpan>,
	pub code_blocks: Vec<(NodeId, Range<usize>)>,
}

impl Layout {
	/// Row on which a highlight wrapper starts.
	pub fn anchor(&self, marker: NodeId) -> Option<usize> {
		self.anchors.get(&marker).copied()
	}

	pub fn height(&self) -> usize {
		self.lines.len()
	}

	/// Plain text of every row, used by tests and headless previews.
	#[cfg(test)]
	pub fn plain(&self) -> String {
		self.lines
			.iter()
			.map(|line| line.iter().map(|segment| segment.text.as_str()).collect::<String>())
			.collect::<Vec<_>>()
			.join("\n")
	}
}

#[derive(Clone, Copy)]
struct Context {
	tone: Tone,
	preformatted: bool,
	marker: Option<NodeId>,
}

struct Builder<'a> {
	document: &'a Document,
	width: usize,
	layout: Layout,
	pending: Vec<Segment>,
}

/// Lay out the subtree under `root` for a viewport `width` columns wide.
pub fn layout(document: &Document, root: NodeId, width: usize) -> Layout {
	let mut builder = Builder {
		document,
		width: width.max(1),
		layout: Layout::default(),
		pending: Vec::new(),
	};
	builder.node(
		root,
		Context {
			tone: Tone::Plain,
			preformatted: false,
			marker: None,
		},
	);
	builder.flush();
	while builder
		.layout
		.lines
		.last()
		.is_some_and(|line| line.is_empty())
	{
		builder.layout.lines.pop();
	}
	builder.layout
}

impl Builder<'_> {
	fn node(&mut self, node: NodeId, mut context: Context) {
		let element = match self.document.kind(node) {
			Some(NodeKind::Text(text)) => {
				self.text(text, context);
				return;
			}
			Some(NodeKind::Element(element)) => element,
			None => return,
		};
		if HIDDEN_TAGS.iter().any(|tag| element.is(tag)) {
			return;
		}

		if element.has_class(HIGHLIGHT_CLASS) {
			context.tone = if element.has_class(CURRENT_CLASS) {
				Tone::Current
			} else {
				Tone::Highlight
			};
			context.marker = Some(node);
		} else if is_heading(&element.tag) {
			context.tone = Tone::Heading;
		} else if element.is("pre") {
			context.tone = Tone::Code;
			context.preformatted = true;
		}

		let block = BLOCK_TAGS.iter().any(|tag| element.is(tag));
		if block {
			self.flush();
		}
		let start = self.layout.lines.len();
		if element.is("li") {
			self.pending.push(Segment {
				text: BULLET.to_owned(),
				tone: context.tone,
				marker: None,
			});
		}

		let collapsed = element.is("details") && !element.attrs.contains_key("open");
		for &child in self.document.children(node) {
			if collapsed && !self.document.element(child).is_some_and(|child| child.is("summary")) {
				continue;
			}
			self.node(child, context);
		}

		if block {
			self.flush();
			if SPACED_TAGS.iter().any(|tag| element.is(tag)) {
				self.layout.lines.push(Vec::new());
			}
		}
		let rows = start..self.layout.lines.len();
		if element.has_class(SECTION_CLASS)
			&& let Some(id) = element.attrs.get("id")
		{
			self.layout.sections.push(SectionSpan {
				id: id.clone(),
				start: rows.start,
				end: rows.end,
			});
		}
		if element.has_class(CODE_CONTAINER_CLASS) {
			self.layout.code_blocks.push((node, rows));
		}
	}

	fn text(&mut self, text: &str, context: Context) {
		if context.preformatted {
			let mut parts = text.split('\n');
			if let Some(first) = parts.next() {
				self.push(first, context);
			}
			for part in parts {
				self.flush_rows(false);
				self.push(part, context);
			}
		} else {
			let collapsed = text.replace(['\n', '\t'], " ");
			self.push(&collapsed, context);
		}
	}

	fn push(&mut self, text: &str, context: Context) {
		if text.is_empty() && context.marker.is_none() {
			return;
		}
		self.pending.push(Segment {
			text: text.to_owned(),
			tone: context.tone,
			marker: context.marker,
		});
	}

	fn flush(&mut self) {
		self.flush_rows(true);
	}

	/// Wrap the pending segments into rows. A preformatted line break emits a
	/// row even when it is empty.
	fn flush_rows(&mut self, skip_empty: bool) {
		let segments = std::mem::take(&mut self.pending);
		if segments.is_empty() {
			if !skip_empty {
				self.layout.lines.push(Vec::new());
			}
			return;
		}

		let mut row: Vec<Segment> = Vec::new();
		let mut used = 0;
		for segment in segments {
			for token in segment.text.split_inclusive(' ') {
				let token_width = token.width();
				if used > 0 && used + token_width > self.width {
					trim_row_end(&mut row);
					self.layout.lines.push(std::mem::take(&mut row));
					used = 0;
					if token.trim().is_empty() {
						continue;
					}
				}
				if let Some(marker) = segment.marker {
					self.layout
						.anchors
						.entry(marker)
						.or_insert(self.layout.lines.len());
				}
				used += token_width;
				match row.last_mut() {
					Some(last) if last.tone == segment.tone && last.marker == segment.marker => {
						last.text.push_str(token);
					}
					_ => row.push(Segment {
						text: token.to_owned(),
						tone: segment.tone,
						marker: segment.marker,
					}),
				}
			}
		}
		self.layout.lines.push(row);
	}
}

fn is_heading(tag: &str) -> bool {
	matches!(tag.as_bytes(), [h, level] if h.eq_ignore_ascii_case(&b'h') && (b'1'..=b'6').contains(level))
}

/// Drop the space a wrapped row ends with.
fn trim_row_end(row: &mut Vec<Segment>) {
	let Some(last) = row.last_mut() else {
		return;
	};
	let trimmed = last.text.trim_end_matches(' ').len();
	last.text.truncate(trimmed);
	if last.text.is_empty() && last.marker.is_none() {
		row.pop();
	}
}

#[cfg(test)]
mod tests {
	use docfind_core::document::from_text;

	use super::*;

	#[test]
	fn blocks_wrap_and_space_out() {
		let document = from_text("# Intro\n\nThe quick brown fox jumps over the lazy dog\n\n```\nfn main() {\n}\n```")
			.expect("document");
		let layout = layout(&document, document.root(), 20);
		insta::assert_snapshot!(layout.plain(), @r"
		Intro

		The quick brown fox
		jumps over the lazy
		dog

		fn main() {
		}
		");
		assert_eq!(layout.sections.len(), 1);
		assert_eq!(layout.sections[0].start, 0);
		assert_eq!(layout.code_blocks.len(), 1);
		assert_eq!(layout.code_blocks[0].1.start, 6);
	}

	#[test]
	fn highlights_keep_their_row_and_tone() {
		let mut document = from_text("one two three four five six").expect("document");
		let leaf = docfind_core::search::text_leaves(&document, document.root())
			.next()
			.expect("leaf");
		let mut store = docfind_core::search::HighlightStore::new();
		store.materialize(&mut document, &leaf, 14..18).expect("materialize");
		store.set_current(&mut document, 0, true);
		let marker = store.markers()[0].wrapper();

		let layout = layout(&document, document.root(), 10);
		let row = layout.anchor(marker).expect("anchor");
		let current: Vec<_> = layout.lines[row]
			.iter()
			.filter(|segment| segment.tone == Tone::Current)
			.map(|segment| segment.text.as_str())
			.collect();
		assert_eq!(current, vec!["four"]);
		assert_eq!(layout.plain(), "one two\nthree four\nfive six");
	}

	#[test]
	fn collapsed_details_show_only_the_summary() {
		let spec: docfind_core::document::NodeSpec = serde_json::from_value(serde_json::json!({
			"tag": "main",
			"children": [{
				"tag": "details", "id": "more",
				"children": [
					{ "tag": "summary", "children": ["More"] },
					{ "tag": "p", "children": ["hidden body"] }
				]
			}]
		}))
		.expect("spec");
		let mut document = Document::from_spec(&spec).expect("document");
		assert_eq!(layout(&document, document.root(), 40).plain(), "More");

		docfind_core::toc::open_section(&mut document, "more").expect("section");
		assert_eq!(layout(&document, document.root(), 40).plain(), "More\nhidden body");
	}

	#[test]
	fn list_items_get_bullets() {
		let document = from_text("- alpha\n- beta").expect("document");
		let layout = layout(&document, document.root(), 40);
		assert_eq!(layout.plain(), "• alpha\n• beta");
	}
}
