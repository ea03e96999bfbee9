use serde::Serialize;

use crate::document::NodeId;

/// Match option exposed as a toggle in the host UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOption {
	CaseSensitive,
	WholeWords,
}

/// Keys the session reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKey {
	/// Reserved focus shortcut (Ctrl+F / Cmd+F).
	FocusSearch,
	/// `Enter` moves to the next marker, or the previous one when `reverse`.
	Enter { reverse: bool },
	/// `Escape` clears the search and restores the document.
	Escape,
}

/// Host callbacks driven by a [`SearchSession`](super::SearchSession).
///
/// Every method defaults to a no-op so hosts that lack a control simply skip
/// the corresponding update.
pub trait SearchUi {
	/// Counter text such as `3/12`.
	fn set_counter(&mut self, _counter: &str) {}

	/// Show or hide the previous/next controls.
	fn set_navigation_visible(&mut self, _visible: bool) {}

	/// Bring a highlight wrapper into view, centred when possible.
	fn reveal(&mut self, _marker: NodeId) {}

	/// A scan started or stopped.
	fn set_processing(&mut self, _processing: bool) {}

	fn set_option_checked(&mut self, _option: MatchOption, _checked: bool) {}

	/// Empty the query input.
	fn clear_input(&mut self) {}

	/// Focus the query input and select its content.
	fn focus_input(&mut self) {}
}

impl SearchUi for () {}
