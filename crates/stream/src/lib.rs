//! Cooperative scheduling primitives for work that runs on a single control
//! flow and must stay interruptible.
//!
//! Nothing in this crate spawns threads. Long-running work is split into
//! chunks ([`ChunkWindow`]), the control flow is handed back to the scheduler
//! between chunks ([`pause_between_chunks`]), and every unit of work carries a
//! [`Ticket`] from a shared [`Generation`] counter so it can notice when a newer
//! request has superseded it. [`Debouncer`] builds a pure "most recent call
//! wins" timer on the same counter.
//!
//! Superseded work is never killed; it simply re-checks its ticket before each
//! unit of work and stops quietly.
//!
//! ```
//! use docfind_stream::{ChunkWindow, Generation};
//!
//! let generation = Generation::new();
//! let ticket = generation.issue();
//! let mut window = ChunkWindow::new(120, 50);
//! let mut processed = 0;
//! while let Some(range) = window.next_range() {
//! 	if !ticket.is_current() {
//! 		break;
//! 	}
//! 	processed += range.len();
//! }
//! assert_eq!(processed, 120);
//!
//! // A newer request retires the old ticket.
//! let _newer = generation.issue();
//! assert!(!ticket.is_current());
//! ```

mod chunk;
mod debounce;
mod generation;

pub use chunk::{ChunkWindow, DEFAULT_CHUNK_PAUSE, DEFAULT_CHUNK_SIZE, pause_between_chunks};
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use generation::{Generation, Ticket, should_abort};
