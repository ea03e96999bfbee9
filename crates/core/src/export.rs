//! Markdown export of document fragments and the copy pipeline that hands
//! them to a clipboard.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::document::{Document, NodeId};

/// Class of the element wrapping a code listing.
pub const CODE_CONTAINER_CLASS: &str = "code-container";
/// Class of a top-level content section.
pub const SECTION_CLASS: &str = "content-section";
/// Class of the heading inside a content section.
pub const SECTION_TITLE_CLASS: &str = "section-title";

const FENCE_LANGUAGE: &str = "blueprint";
const UNKNOWN_TITLE: &str = "Unknown";
const NO_FLOW: &str = "*(No execution flow)*";
const NO_ITEMS: &str = "*(None)*";
const EMPTY_FLOW_SENTINEL: &str = "No valid entry node found for execution flow";

/// Reasons an export produced nothing to copy. The messages are shown as-is
/// in the host status line.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ExportError {
	#[error("No code")]
	NoCode,
	#[error("No content")]
	NoContent,
	#[error("No section")]
	NoSection,
}

/// What part of a section to copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyTarget {
	/// The execution trace listing.
	Trace,
	/// Inputs, execution flow and outputs.
	Definition,
}

/// Fenced markdown for the code listing enclosing `node`.
pub fn code_block_markdown(document: &Document, node: NodeId) -> Result<String, ExportError> {
	let container = document
		.closest_with_class(node, CODE_CONTAINER_CLASS)
		.ok_or(ExportError::NoCode)?;
	let code = pre_code(document, container).ok_or(ExportError::NoCode)?;
	let text = document.text_content(code);
	let text = text.trim();
	if text.is_empty() {
		return Err(ExportError::NoContent);
	}
	Ok(fenced(text))
}

/// Markdown summary of the section enclosing `node`.
pub fn section_markdown(document: &Document, node: NodeId, target: CopyTarget) -> Result<String, ExportError> {
	let section = document
		.closest_with_class(node, SECTION_CLASS)
		.ok_or(ExportError::NoSection)?;
	let mut out = format!("### {}\n\n", section_title(document, section));
	let code = pre_code(document, section)
		.map(|code| document.text_content(code).trim().to_owned())
		.unwrap_or_default();

	match target {
		CopyTarget::Trace => {
			out.push_str(&fenced(if code.is_empty() { NO_FLOW } else { &code }));
		}
		CopyTarget::Definition => {
			out.push_str("**Inputs**\n");
			out.push_str(&io_list_markdown(document, section, "Inputs"));
			out.push_str("\n\n");
			if !code.is_empty() && code != EMPTY_FLOW_SENTINEL {
				out.push_str("**Execution Flow**\n");
				out.push_str(&fenced(&code));
				out.push_str("\n\n");
			}
			out.push_str("**Outputs**\n");
			out.push_str(&io_list_markdown(document, section, "Outputs"));
		}
	}
	Ok(out.trim().to_owned())
}

/// Title of a content section, `Unknown` when it has no title element.
///
/// A title element without text yields an empty title.
#[must_use]
pub fn section_title(document: &Document, section: NodeId) -> String {
	document
		.find_first(section, |node| document.has_class(node, SECTION_TITLE_CLASS))
		.map_or_else(
			|| UNKNOWN_TITLE.to_owned(),
			|title| document.text_content(title).trim().to_owned(),
		)
}

fn fenced(text: &str) -> String {
	format!("```{FENCE_LANGUAGE}\n{text}\n```")
}

/// First `code` element nested in a `pre` under `scope`.
fn pre_code(document: &Document, scope: NodeId) -> Option<NodeId> {
	document.find_first(scope, |node| {
		document.element(node).is_some_and(|element| element.is("code"))
			&& document
				.ancestors(node)
				.take_while(|&ancestor| ancestor != scope)
				.chain(Some(scope))
				.any(|ancestor| document.element(ancestor).is_some_and(|element| element.is("pre")))
	})
}

fn io_list_markdown(document: &Document, section: NodeId, heading: &str) -> String {
	let list = document
		.find_first(section, |node| {
			document.element(node).is_some_and(|element| element.is("h4"))
				&& document.text_content(node).trim().eq_ignore_ascii_case(heading)
		})
		.and_then(|heading| document.next_element_sibling(heading))
		.filter(|&list| document.has_class(list, "io-list"));
	let Some(list) = list else {
		return NO_ITEMS.to_owned();
	};

	let field = |item: NodeId, class: &str| {
		document
			.find_first(item, |node| document.has_class(node, class))
			.map(|node| document.text_content(node).trim().to_owned())
			.unwrap_or_default()
	};
	let lines: Vec<String> = document
		.find_by_class(list, "io-item")
		.into_iter()
		.filter_map(|item| {
			let kind = field(item, "io-type");
			let name = field(item, "io-name");
			(!kind.is_empty() && !name.is_empty()).then(|| format!("* `{kind}` `{name}`"))
		})
		.collect();
	if lines.is_empty() {
		NO_ITEMS.to_owned()
	} else {
		lines.join("\n")
	}
}

/// Failure of a clipboard mechanism.
#[derive(Debug, Error)]
pub enum ClipboardError {
	#[error("clipboard mechanism is unavailable")]
	Unavailable,

	#[error("clipboard command `{command}` failed: {reason}")]
	Command { command: String, reason: String },

	#[error("failed to reach the clipboard: {0}")]
	Io(#[from] std::io::Error),
}

/// A way of placing text on the system clipboard.
pub trait Clipboard {
	/// Short name used in logs.
	fn name(&self) -> &str;

	fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Whether a status message reports success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
	Success,
	Error,
}

/// How long status messages stay visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashTiming {
	pub success: Duration,
	pub error: Duration,
}

impl Default for FlashTiming {
	fn default() -> Self {
		Self {
			success: Duration::from_millis(2000),
			error: Duration::from_millis(3000),
		}
	}
}

/// Transient inline status shown on the control that triggered a copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusFlash {
	pub kind: FlashKind,
	pub message: String,
	#[serde(skip)]
	pub duration: Duration,
}

impl StatusFlash {
	#[must_use]
	pub fn copied(timing: FlashTiming) -> Self {
		Self {
			kind: FlashKind::Success,
			message: "Copied!".to_owned(),
			duration: timing.success,
		}
	}

	#[must_use]
	pub fn error(message: impl Into<String>, timing: FlashTiming) -> Self {
		Self {
			kind: FlashKind::Error,
			message: message.into(),
			duration: timing.error,
		}
	}
}

impl From<(ExportError, FlashTiming)> for StatusFlash {
	fn from((error, timing): (ExportError, FlashTiming)) -> Self {
		Self::error(error.to_string(), timing)
	}
}

/// Copy `text` with `primary`, falling back to `fallback` when it fails.
pub fn copy_with_fallback(
	primary: &mut dyn Clipboard,
	fallback: &mut dyn Clipboard,
	text: &str,
	timing: FlashTiming,
) -> StatusFlash {
	match primary.write_text(text) {
		Ok(()) => return StatusFlash::copied(timing),
		Err(error) => {
			tracing::debug!(mechanism = primary.name(), %error, "primary copy failed; trying fallback");
		}
	}
	match fallback.write_text(text) {
		Ok(()) => StatusFlash::copied(timing),
		Err(error) => {
			tracing::warn!(mechanism = fallback.name(), %error, "copy failed");
			StatusFlash::error("Copy failed", timing)
		}
	}
}
