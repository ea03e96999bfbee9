//! Incremental in-document search for rendered document trees.
//!
//! The crate ships the host [`document`] tree, the search building blocks in
//! [`search`], and [`SearchSession`], the state machine a viewer drives from
//! its input events. [`export`] and [`toc`] cover copying fragments as
//! markdown and following sections while scrolling.
//!
//! ```
//! use docfind_core::document::from_text;
//! use docfind_core::search::{BatchSearchJob, CompiledPattern, HighlightStore, MatchOptions, Query};
//! use docfind_stream::Generation;
//!
//! let mut document = from_text("# Intro\n\nThe quick fox\n\nover the fox").unwrap();
//! let pattern = CompiledPattern::compile(&Query::new("fox", MatchOptions::default()));
//! let mut job = BatchSearchJob::capture(&document, document.root(), Generation::new().issue(), pattern, 50);
//! let mut store = HighlightStore::new();
//! job.run_to_completion(&mut document, &mut store);
//! assert_eq!(store.len(), 2);
//!
//! store.restore_all(&mut document);
//! assert_eq!(document.text_content(document.root()), "IntroThe quick foxover the fox");
//! ```

pub mod document;
pub mod export;
pub mod search;
pub mod session;
pub mod toc;

pub use document::{Document, Element, NodeId, NodeKind, TreeError};
pub use session::{MatchOption, Phase, SearchKey, SearchSession, SearchSettings, SearchSnapshot, SearchUi};
