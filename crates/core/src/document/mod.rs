//! In-memory document tree that hosts rendered content.
//!
//! Nodes live in a generational arena: a [`NodeId`] names a slot plus the
//! generation it was allocated in, so a handle kept around after its node was
//! discarded never resolves to whatever reuses the slot later. Structural
//! operations mirror the small subset of DOM behaviour the search core relies
//! on: pre-order traversal, text access, fragment-style `replace_child` and
//! `normalize`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

mod load;

pub use load::{LoadError, NodeSpec, from_text};

/// Handle to a node stored in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: u32,
	generation: u32,
}

/// Structural element with a tag, a class list and free-form attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
	pub tag: String,
	pub classes: Vec<String>,
	pub attrs: BTreeMap<String, String>,
}

impl Element {
	/// Create an element with the provided tag and no classes or attributes.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			classes: Vec::new(),
			attrs: BTreeMap::new(),
		}
	}

	/// Add a class to the element.
	#[must_use]
	pub fn with_class(mut self, class: impl Into<String>) -> Self {
		let class = class.into();
		if !self.has_class(&class) {
			self.classes.push(class);
		}
		self
	}

	/// Set an attribute on the element.
	#[must_use]
	pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.insert(name.into(), value.into());
		self
	}

	/// Whether the element carries `class`.
	#[must_use]
	pub fn has_class(&self, class: &str) -> bool {
		self.classes.iter().any(|existing| existing == class)
	}

	/// Compare the tag name, ignoring ASCII case.
	#[must_use]
	pub fn is(&self, tag: &str) -> bool {
		self.tag.eq_ignore_ascii_case(tag)
	}
}

/// Payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Element(Element),
	Text(String),
}

#[derive(Clone, Debug)]
struct Node {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
struct Slot {
	generation: u32,
	node: Option<Node>,
}

/// Errors raised by structural operations on a [`Document`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
	/// The handle does not resolve to a live node.
	#[error("node {0:?} does not exist")]
	Missing(NodeId),

	/// The node is not a direct child of the given parent.
	#[error("node {child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeId, child: NodeId },

	/// The node must be detached for this operation.
	#[error("node {0:?} is attached to a parent")]
	Attached(NodeId),

	/// The operation requires an element.
	#[error("node {0:?} is not an element")]
	NotAnElement(NodeId),

	/// Inserting the node would make it its own ancestor.
	#[error("node {0:?} would become its own ancestor")]
	Cycle(NodeId),
}

/// Arena-backed document tree with a single root element.
#[derive(Clone, Debug)]
pub struct Document {
	slots: Vec<Slot>,
	free: Vec<u32>,
	root: NodeId,
}

impl Document {
	/// Create an empty document whose root element uses `root_tag`.
	pub fn new(root_tag: impl Into<String>) -> Self {
		Self::with_root(Element::new(root_tag))
	}

	/// Create an empty document with a fully specified root element.
	pub fn with_root(root: Element) -> Self {
		let mut document = Self {
			slots: Vec::new(),
			free: Vec::new(),
			root: NodeId {
				index: 0,
				generation: 0,
			},
		};
		document.root = document.alloc(NodeKind::Element(root));
		document
	}

	/// Root element of the document.
	#[must_use]
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Number of live nodes, attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.slots.iter().filter(|slot| slot.node.is_some()).count()
	}

	/// Allocate a detached element.
	pub fn create_element(&mut self, element: Element) -> NodeId {
		self.alloc(NodeKind::Element(element))
	}

	/// Allocate a detached text node.
	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.alloc(NodeKind::Text(text.into()))
	}

	/// Whether the handle resolves to a live node.
	#[must_use]
	pub fn contains(&self, id: NodeId) -> bool {
		self.node(id).is_some()
	}

	/// Payload of the node.
	#[must_use]
	pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
		self.node(id).map(|node| &node.kind)
	}

	/// Text of a text node.
	#[must_use]
	pub fn text(&self, id: NodeId) -> Option<&str> {
		match self.kind(id)? {
			NodeKind::Text(text) => Some(text),
			NodeKind::Element(_) => None,
		}
	}

	/// Element payload of an element node.
	#[must_use]
	pub fn element(&self, id: NodeId) -> Option<&Element> {
		match self.kind(id)? {
			NodeKind::Element(element) => Some(element),
			NodeKind::Text(_) => None,
		}
	}

	fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
		match self.node_mut(id).map(|node| &mut node.kind) {
			Some(NodeKind::Element(element)) => Ok(element),
			Some(NodeKind::Text(_)) => Err(TreeError::NotAnElement(id)),
			None => Err(TreeError::Missing(id)),
		}
	}

	/// Parent of the node, if attached.
	#[must_use]
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id)?.parent
	}

	/// Children of the node in order. Missing nodes have no children.
	#[must_use]
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.node(id).map_or(&[], |node| node.children.as_slice())
	}

	/// Whether the node is an element carrying `class`.
	#[must_use]
	pub fn has_class(&self, id: NodeId, class: &str) -> bool {
		self.element(id).is_some_and(|element| element.has_class(class))
	}

	/// Add `class` to an element. Returns `false` when it was already present
	/// or the node is not an element.
	pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
		match self.element_mut(id) {
			Ok(element) if !element.has_class(class) => {
				element.classes.push(class.to_owned());
				true
			}
			_ => false,
		}
	}

	/// Remove `class` from an element. Returns `false` when it was absent.
	pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
		let Ok(element) = self.element_mut(id) else {
			return false;
		};
		let before = element.classes.len();
		element.classes.retain(|existing| existing != class);
		element.classes.len() != before
	}

	/// Attribute value of an element.
	#[must_use]
	pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id)?.attrs.get(name).map(String::as_str)
	}

	/// Set an attribute on an element.
	pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
		self.element_mut(id)?
			.attrs
			.insert(name.to_owned(), value.to_owned());
		Ok(())
	}

	/// Append a detached node as the last child of `parent`.
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
		self.element(parent).ok_or_else(|| self.missing_or_not_element(parent))?;
		self.check_insertable(parent, child)?;
		if let Some(node) = self.node_mut(child) {
			node.parent = Some(parent);
		}
		if let Some(node) = self.node_mut(parent) {
			node.children.push(child);
		}
		Ok(())
	}

	/// Replace `old` with `replacements`, in order, at the same position.
	///
	/// This follows fragment semantics: an empty `replacements` slice removes
	/// `old`. The replaced node is detached but stays alive so callers can
	/// re-insert or [`discard`](Self::discard) it.
	pub fn replace_child(
		&mut self,
		parent: NodeId,
		old: NodeId,
		replacements: &[NodeId],
	) -> Result<(), TreeError> {
		let position = self.child_position(parent, old)?;
		for (offset, &replacement) in replacements.iter().enumerate() {
			if replacement == old {
				return Err(TreeError::Attached(old));
			}
			if replacements[..offset].contains(&replacement) {
				return Err(TreeError::Attached(replacement));
			}
			self.check_insertable(parent, replacement)?;
		}

		if let Some(node) = self.node_mut(parent) {
			node.children
				.splice(position..=position, replacements.iter().copied());
		}
		if let Some(node) = self.node_mut(old) {
			node.parent = None;
		}
		for &replacement in replacements {
			if let Some(node) = self.node_mut(replacement) {
				node.parent = Some(parent);
			}
		}
		Ok(())
	}

	/// Detach `child` from `parent`, keeping it alive.
	pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
		self.replace_child(parent, child, &[])
	}

	/// Free a detached node and its whole subtree.
	pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
		let node = self.node(id).ok_or(TreeError::Missing(id))?;
		if node.parent.is_some() || id == self.root {
			return Err(TreeError::Attached(id));
		}
		self.free_subtree(id);
		Ok(())
	}

	/// Whether the node is reachable from the root.
	#[must_use]
	pub fn is_attached(&self, id: NodeId) -> bool {
		if !self.contains(id) {
			return false;
		}
		id == self.root || self.ancestors(id).any(|ancestor| ancestor == self.root)
	}

	/// Ancestors of the node, nearest first.
	pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		std::iter::successors(self.parent(id), move |&current| self.parent(current))
	}

	/// The node itself followed by its descendants in pre-order.
	#[must_use]
	pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
		let stack = if self.contains(id) { vec![id] } else { Vec::new() };
		Descendants {
			document: self,
			stack,
		}
	}

	/// Concatenated text of every text node under `id`, in document order.
	#[must_use]
	pub fn text_content(&self, id: NodeId) -> String {
		self.descendants(id)
			.filter_map(|node| self.text(node))
			.collect()
	}

	/// Merge adjacent text runs and drop empty text nodes under `id`.
	pub fn normalize(&mut self, id: NodeId) {
		let Some(node) = self.node(id) else {
			return;
		};
		let children = node.children.clone();
		let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
		let mut dropped = Vec::new();

		for child in children {
			let Some(text) = self.text(child) else {
				self.normalize(child);
				kept.push(child);
				continue;
			};
			if text.is_empty() {
				dropped.push(child);
			} else if let Some(&previous) = kept.last()
				&& self.text(previous).is_some()
			{
				let addition = text.to_owned();
				if let Some(Node {
					kind: NodeKind::Text(existing),
					..
				}) = self.node_mut(previous)
				{
					existing.push_str(&addition);
				}
				dropped.push(child);
			} else {
				kept.push(child);
			}
		}

		if let Some(node) = self.node_mut(id) {
			node.children = kept;
		}
		for child in dropped {
			if let Some(node) = self.node_mut(child) {
				node.parent = None;
			}
			self.free_subtree(child);
		}
	}

	/// Elements under `root` (inclusive) carrying `class`, in document order.
	#[must_use]
	pub fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
		self.descendants(root)
			.filter(|&node| self.has_class(node, class))
			.collect()
	}

	/// First element in the document whose `id` attribute equals `value`.
	#[must_use]
	pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
		self.descendants(self.root)
			.find(|&node| self.attr(node, "id") == Some(value))
	}

	/// First node under `root` (inclusive) accepted by `predicate`.
	pub fn find_first<P>(&self, root: NodeId, mut predicate: P) -> Option<NodeId>
	where
		P: FnMut(NodeId) -> bool,
	{
		self.descendants(root).find(|&node| predicate(node))
	}

	/// Nearest inclusive ancestor carrying `class`.
	#[must_use]
	pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
		std::iter::once(id)
			.chain(self.ancestors(id))
			.find(|&node| self.has_class(node, class))
	}

	/// Next sibling of `id` that is an element.
	#[must_use]
	pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent(id)?;
		self.children(parent)
			.iter()
			.skip_while(|&&sibling| sibling != id)
			.skip(1)
			.copied()
			.find(|&sibling| self.element(sibling).is_some())
	}

	/// Render the subtree as markup, mainly for previews and assertions.
	#[must_use]
	pub fn to_markup(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_markup(id, &mut out);
		out
	}

	fn write_markup(&self, id: NodeId, out: &mut String) {
		match self.kind(id) {
			Some(NodeKind::Text(text)) => escape_into(text, out),
			Some(NodeKind::Element(element)) => {
				let _ = write!(out, "<{}", element.tag);
				if !element.classes.is_empty() {
					let _ = write!(out, " class=\"{}\"", element.classes.join(" "));
				}
				for (name, value) in &element.attrs {
					let _ = write!(out, " {name}=\"");
					escape_into(value, out);
					out.push('"');
				}
				out.push('>');
				for &child in self.children(id) {
					self.write_markup(child, out);
				}
				let _ = write!(out, "</{}>", element.tag);
			}
			None => {}
		}
	}

	fn alloc(&mut self, kind: NodeKind) -> NodeId {
		let node = Node {
			kind,
			parent: None,
			children: Vec::new(),
		};
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.node = Some(node);
			return NodeId {
				index,
				generation: slot.generation,
			};
		}
		let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
		self.slots.push(Slot {
			generation: 0,
			node: Some(node),
		});
		NodeId {
			index,
			generation: 0,
		}
	}

	fn free_subtree(&mut self, id: NodeId) {
		let mut pending = vec![id];
		while let Some(current) = pending.pop() {
			let Some(slot) = self.slots.get_mut(current.index as usize) else {
				continue;
			};
			if slot.generation != current.generation {
				continue;
			}
			if let Some(node) = slot.node.take() {
				slot.generation = slot.generation.wrapping_add(1);
				self.free.push(current.index);
				pending.extend(node.children);
			}
		}
	}

	fn node(&self, id: NodeId) -> Option<&Node> {
		let slot = self.slots.get(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		slot.node.as_ref()
	}

	fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		let slot = self.slots.get_mut(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		slot.node.as_mut()
	}

	fn missing_or_not_element(&self, id: NodeId) -> TreeError {
		if self.contains(id) {
			TreeError::NotAnElement(id)
		} else {
			TreeError::Missing(id)
		}
	}

	fn child_position(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
		let node = self.node(parent).ok_or(TreeError::Missing(parent))?;
		node.children
			.iter()
			.position(|&existing| existing == child)
			.ok_or(TreeError::NotAChild { parent, child })
	}

	fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
		let node = self.node(child).ok_or(TreeError::Missing(child))?;
		if node.parent.is_some() || child == self.root {
			return Err(TreeError::Attached(child));
		}
		if parent == child || self.ancestors(parent).any(|ancestor| ancestor == child) {
			return Err(TreeError::Cycle(child));
		}
		Ok(())
	}
}

/// Pre-order traversal produced by [`Document::descendants`].
pub struct Descendants<'a> {
	document: &'a Document,
	stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.stack.pop()?;
		self.stack
			.extend(self.document.children(current).iter().rev().copied());
		Some(current)
	}
}

fn escape_into(text: &str, out: &mut String) {
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			other => out.push(other),
		}
	}
}
