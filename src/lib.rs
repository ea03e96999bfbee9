//! Terminal document viewer built on [`docfind_core`].
//!
//! The library half of the `docfind` binary: application directories, the
//! logging setup, system clipboard mechanisms and the ratatui viewer that
//! hosts a search session.

pub mod app_dirs;
pub mod clipboard;
pub mod logging;
pub mod viewer;

pub use viewer::{Viewer, ViewerSettings, run};
