//! Building blocks of the in-document search: query compilation, leaf
//! enumeration, chunked scanning, highlight materialization and navigation.

mod cursor;
mod highlight;
mod job;
mod pattern;
mod scanner;

pub use cursor::{Direction, NavigationCursor, Position};
pub use highlight::{CURRENT_CLASS, HIGHLIGHT_CLASS, HighlightError, HighlightStore, MatchMarker};
pub use job::{BatchSearchJob, ChunkOutcome};
pub use pattern::{CompiledPattern, MIN_TERM_CHARS, MatchOptions, Query, WILDCARD};
pub use scanner::{TextLeaf, TextLeaves, text_leaves};
