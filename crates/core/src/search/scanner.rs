use crate::document::{Document, NodeId, NodeKind};

use super::highlight::HIGHLIGHT_CLASS;

/// Elements whose content is never rendered as text.
const EXCLUDED_TAGS: [&str; 2] = ["script", "style"];

/// Searchable text captured at enumeration time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLeaf {
	pub node: NodeId,
	pub parent: NodeId,
	pub text: String,
}

/// Enumerate the searchable text leaves under `root` in pre-order.
///
/// Script and style payloads and existing highlight markers are pruned along
/// with their whole subtree, and whitespace-only leaves are skipped.
#[must_use]
pub fn text_leaves(document: &Document, root: NodeId) -> TextLeaves<'_> {
	let stack = if document.contains(root) {
		vec![root]
	} else {
		Vec::new()
	};
	TextLeaves { document, stack }
}

/// Lazy iterator returned by [`text_leaves`].
pub struct TextLeaves<'a> {
	document: &'a Document,
	stack: Vec<NodeId>,
}

impl Iterator for TextLeaves<'_> {
	type Item = TextLeaf;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(current) = self.stack.pop() {
			match self.document.kind(current) {
				Some(NodeKind::Element(element)) => {
					let excluded = element.has_class(HIGHLIGHT_CLASS)
						|| EXCLUDED_TAGS.iter().any(|tag| element.is(tag));
					if !excluded {
						self.stack
							.extend(self.document.children(current).iter().rev().copied());
					}
				}
				Some(NodeKind::Text(text)) => {
					if text.trim().is_empty() {
						continue;
					}
					let Some(parent) = self.document.parent(current) else {
						continue;
					};
					return Some(TextLeaf {
						node: current,
						parent,
						text: text.clone(),
					});
				}
				None => {}
			}
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Element;

	fn push(document: &mut Document, parent: NodeId, element: Element, text: &str) -> NodeId {
		let node = document.create_element(element);
		document.append_child(parent, node).expect("append element");
		let leaf = document.create_text(text);
		document.append_child(node, leaf).expect("append text");
		node
	}

	#[test]
	fn skips_payloads_markers_and_blank_text() {
		let mut document = Document::new("main");
		let root = document.root();
		push(&mut document, root, Element::new("p"), "visible");
		push(&mut document, root, Element::new("SCRIPT"), "let hidden = 1;");
		push(&mut document, root, Element::new("style"), "p { color: red }");
		push(&mut document, root, Element::new("span").with_class(HIGHLIGHT_CLASS), "marked");
		push(&mut document, root, Element::new("p"), "  \n\t ");
		let nested = push(&mut document, root, Element::new("div"), "outer");
		push(&mut document, nested, Element::new("em"), "inner");

		let texts: Vec<_> = text_leaves(&document, root).map(|leaf| leaf.text).collect();
		assert_eq!(texts, vec!["visible", "outer", "inner"]);
	}

	#[test]
	fn records_owning_element() {
		let mut document = Document::new("main");
		let root = document.root();
		let p = push(&mut document, root, Element::new("p"), "hello");
		let leaf = text_leaves(&document, root).next().expect("one leaf");
		assert_eq!(leaf.parent, p);
		assert_eq!(document.text(leaf.node), Some("hello"));
	}

	#[test]
	fn detached_or_missing_root_yields_nothing() {
		let mut document = Document::new("main");
		let root = document.root();
		let p = push(&mut document, root, Element::new("p"), "gone");
		document.remove_child(root, p).expect("detach");
		document.discard(p).expect("discard");
		assert_eq!(text_leaves(&document, p).count(), 0);
		assert_eq!(text_leaves(&document, root).count(), 0);
	}
}
