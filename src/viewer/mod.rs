//! Terminal viewer: renders a document and drives a search session from key
//! presses.

mod input;
mod layout;
mod render;
mod runtime;
mod state;
mod theme;

#[cfg(test)]
mod tests;

pub use runtime::run;
pub use state::{Focus, TerminalUi, Viewer, ViewerSettings};
