use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Document, Element, NodeId, TreeError};

/// Tag used for the root when a document is built from plain text.
const TEXT_ROOT_TAG: &str = "main";

/// Serialized form of a document node.
///
/// A bare string is a text node; an object is an element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
	Text(String),
	Element {
		tag: String,
		/// Space separated class list.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		class: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		id: Option<String>,
		#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
		attrs: BTreeMap<String, String>,
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		children: Vec<NodeSpec>,
	},
}

/// Errors raised while building a document from an external source.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("failed to parse document tree: {0}")]
	Json(#[from] serde_json::Error),

	#[error("failed to assemble document tree: {0}")]
	Tree(#[from] TreeError),
}

impl Document {
	/// Parse a JSON node tree. A top-level text node is wrapped in a `body`.
	pub fn from_json(source: &str) -> Result<Self, LoadError> {
		let spec: NodeSpec = serde_json::from_str(source)?;
		Self::from_spec(&spec)
	}

	/// Build a document from an already deserialized node tree.
	pub fn from_spec(spec: &NodeSpec) -> Result<Self, LoadError> {
		match spec {
			NodeSpec::Text(_) => {
				let mut document = Self::new("body");
				let root = document.root();
				document.build_spec(root, spec)?;
				Ok(document)
			}
			NodeSpec::Element { children, .. } => {
				let mut document = Self::with_root(element_from_spec(spec));
				let root = document.root();
				for child in children {
					document.build_spec(root, child)?;
				}
				Ok(document)
			}
		}
	}

	fn build_spec(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<(), TreeError> {
		match spec {
			NodeSpec::Text(text) => {
				let node = self.create_text(text.clone());
				self.append_child(parent, node)
			}
			NodeSpec::Element { children, .. } => {
				let node = self.create_element(element_from_spec(spec));
				self.append_child(parent, node)?;
				for child in children {
					self.build_spec(node, child)?;
				}
				Ok(())
			}
		}
	}
}

fn element_from_spec(spec: &NodeSpec) -> Element {
	let NodeSpec::Element {
		tag,
		class,
		id,
		attrs,
		..
	} = spec
	else {
		return Element::new("span");
	};
	let mut element = Element::new(tag.clone());
	element.attrs = attrs.clone();
	for class in class.iter().flat_map(|list| list.split_whitespace()) {
		element = element.with_class(class);
	}
	if let Some(id) = id {
		element = element.with_attr("id", id.clone());
	}
	element
}

/// Build a document from lightweight markdown-like text.
///
/// * `# Title` opens a `section.content-section` with an `h2.section-title`;
///   deeper headings become `h3` inside the current section.
/// * Blank-line separated runs of text become `p` elements.
/// * `- item` lines become `ul > li`.
/// * Fenced blocks become `div.code-container > pre > code`.
pub fn from_text(source: &str) -> Result<Document, LoadError> {
	let mut builder = TextBuilder::new();
	for line in source.lines() {
		builder.line(line)?;
	}
	builder.finish()
}

struct TextBuilder {
	document: Document,
	container: NodeId,
	paragraph: Vec<String>,
	list: Option<NodeId>,
	fence: Option<Vec<String>>,
	slugs: HashSet<String>,
}

impl TextBuilder {
	fn new() -> Self {
		let document = Document::new(TEXT_ROOT_TAG);
		let container = document.root();
		Self {
			document,
			container,
			paragraph: Vec::new(),
			list: None,
			fence: None,
			slugs: HashSet::new(),
		}
	}

	fn line(&mut self, line: &str) -> Result<(), TreeError> {
		let trimmed = line.trim();
		if trimmed.starts_with("```") {
			match self.fence.take() {
				Some(lines) => self.code_block(&lines)?,
				None => {
					self.flush()?;
					self.fence = Some(Vec::new());
				}
			}
			return Ok(());
		}
		if let Some(lines) = self.fence.as_mut() {
			lines.push(line.to_owned());
			return Ok(());
		}

		if let Some((level, title)) = heading(trimmed) {
			self.flush()?;
			return if level == 1 {
				self.section(title)
			} else {
				let node = self.child(self.container, Element::new("h3"))?;
				self.text(node, title)
			};
		}

		if let Some(item) = trimmed.strip_prefix("- ") {
			self.flush_paragraph()?;
			let list = match self.list {
				Some(list) => list,
				None => {
					let list = self.child(self.container, Element::new("ul"))?;
					self.list = Some(list);
					list
				}
			};
			let node = self.child(list, Element::new("li"))?;
			return self.text(node, item.trim());
		}

		if trimmed.is_empty() {
			return self.flush();
		}
		self.list = None;
		self.paragraph.push(trimmed.to_owned());
		Ok(())
	}

	fn finish(mut self) -> Result<Document, LoadError> {
		if let Some(lines) = self.fence.take() {
			self.code_block(&lines)?;
		}
		self.flush()?;
		Ok(self.document)
	}

	fn section(&mut self, title: &str) -> Result<(), TreeError> {
		let slug = self.unique_slug(title);
		let root = self.document.root();
		let section = self.child(
			root,
			Element::new("section")
				.with_class("content-section")
				.with_attr("id", slug),
		)?;
		let heading = self.child(section, Element::new("h2").with_class("section-title"))?;
		self.text(heading, title)?;
		self.container = section;
		Ok(())
	}

	fn code_block(&mut self, lines: &[String]) -> Result<(), TreeError> {
		let container = self.child(self.container, Element::new("div").with_class("code-container"))?;
		let pre = self.child(container, Element::new("pre"))?;
		let code = self.child(pre, Element::new("code"))?;
		self.text(code, &lines.join("\n"))
	}

	fn flush(&mut self) -> Result<(), TreeError> {
		self.list = None;
		self.flush_paragraph()
	}

	fn flush_paragraph(&mut self) -> Result<(), TreeError> {
		if self.paragraph.is_empty() {
			return Ok(());
		}
		let text = self.paragraph.join(" ");
		self.paragraph.clear();
		let node = self.child(self.container, Element::new("p"))?;
		self.text(node, &text)
	}

	fn child(&mut self, parent: NodeId, element: Element) -> Result<NodeId, TreeError> {
		let node = self.document.create_element(element);
		self.document.append_child(parent, node)?;
		Ok(node)
	}

	fn text(&mut self, parent: NodeId, text: &str) -> Result<(), TreeError> {
		if text.is_empty() {
			return Ok(());
		}
		let node = self.document.create_text(text);
		self.document.append_child(parent, node)
	}

	fn unique_slug(&mut self, title: &str) -> String {
		let base = slugify(title);
		let mut candidate = base.clone();
		let mut suffix = 2;
		while !self.slugs.insert(candidate.clone()) {
			candidate = format!("{base}-{suffix}");
			suffix += 1;
		}
		candidate
	}
}

fn heading(line: &str) -> Option<(usize, &str)> {
	let level = line.chars().take_while(|&ch| ch == '#').count();
	if level == 0 {
		return None;
	}
	let rest = &line[level..];
	rest.starts_with(' ')
		.then(|| (level, rest.trim()))
		.filter(|(_, title)| !title.is_empty())
}

fn slugify(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());
	for ch in title.chars().flat_map(char::to_lowercase) {
		if ch.is_alphanumeric() {
			slug.push(ch);
		} else if !slug.is_empty() && !slug.ends_with('-') {
			slug.push('-');
		}
	}
	while slug.ends_with('-') {
		slug.pop();
	}
	if slug.is_empty() {
		slug.push_str("section");
	}
	slug
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_strings_become_text_nodes() {
		let document = Document::from_json(
			r#"{"tag":"div","class":"body wide","id":"top","children":["Hello ",{"tag":"b","children":["world"]}]}"#,
		)
		.expect("valid tree");
		let root = document.root();
		assert_eq!(document.attr(root, "id"), Some("top"));
		assert!(document.has_class(root, "wide"));
		assert_eq!(document.text_content(root), "Hello world");
		assert_eq!(document.children(root).len(), 2);
	}

	#[test]
	fn top_level_text_is_wrapped() {
		let document = Document::from_json(r#""just text""#).expect("valid tree");
		assert_eq!(document.element(document.root()).map(|e| e.tag.as_str()), Some("body"));
		assert_eq!(document.text_content(document.root()), "just text");
	}

	#[test]
	fn malformed_json_is_reported() {
		let error = Document::from_json("{").expect_err("invalid json");
		assert!(matches!(error, LoadError::Json(_)));
	}

	#[test]
	fn text_loader_builds_sections_and_code() {
		let source = "# Event Graph\n\nFirst line\nsecond line\n\n```\nbranch\n```\n- alpha\n- beta\n\n# Event Graph\n";
		let document = from_text(source).expect("text document");
		let sections = document.find_by_class(document.root(), "content-section");
		assert_eq!(sections.len(), 2);
		assert_eq!(document.attr(sections[0], "id"), Some("event-graph"));
		assert_eq!(document.attr(sections[1], "id"), Some("event-graph-2"));

		insta::assert_snapshot!(document.to_markup(sections[0]), @r#"<section class="content-section" id="event-graph"><h2 class="section-title">Event Graph</h2><p>First line second line</p><div class="code-container"><pre><code>branch</code></pre></div><ul><li>alpha</li><li>beta</li></ul></section>"#);
	}

	#[test]
	fn unterminated_fence_is_kept() {
		let document = from_text("```\nlet x = 1;").expect("text document");
		let code = document.find_first(document.root(), |node| {
			document.element(node).is_some_and(|element| element.is("code"))
		});
		assert_eq!(code.map(|node| document.text_content(node)), Some("let x = 1;".into()));
	}

	#[test]
	fn slugs_fall_back_for_symbol_titles() {
		assert_eq!(slugify("Hello, World!"), "hello-world");
		assert_eq!(slugify("???"), "section");
	}
}
