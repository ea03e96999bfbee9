use std::cell::RefCell;
use std::time::Duration;

use docfind_stream::{ChunkWindow, Ticket, pause_between_chunks};

use super::highlight::HighlightStore;
use super::pattern::CompiledPattern;
use super::scanner::{TextLeaf, text_leaves};
use crate::document::{Document, NodeId};

/// Result of advancing a [`BatchSearchJob`] by one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
	/// More leaves remain.
	Pending,
	/// Every leaf was scanned.
	Finished,
	/// A newer request retired the job; nothing further was highlighted.
	Superseded,
}

/// Interruptible, chunked scan of captured text leaves.
#[derive(Debug)]
pub struct BatchSearchJob {
	ticket: Ticket,
	pattern: CompiledPattern,
	leaves: Vec<TextLeaf>,
	window: ChunkWindow,
	found: usize,
}

impl BatchSearchJob {
	/// Capture the searchable leaves under `root` for a new job.
	pub fn capture(
		document: &Document,
		root: NodeId,
		ticket: Ticket,
		pattern: CompiledPattern,
		chunk_size: usize,
	) -> Self {
		let leaves = text_leaves(document, root).collect();
		Self::new(ticket, pattern, leaves, chunk_size)
	}

	pub fn new(ticket: Ticket, pattern: CompiledPattern, leaves: Vec<TextLeaf>, chunk_size: usize) -> Self {
		let window = ChunkWindow::new(leaves.len(), chunk_size);
		Self {
			ticket,
			pattern,
			leaves,
			window,
			found: 0,
		}
	}

	#[must_use]
	pub fn id(&self) -> u64 {
		self.ticket.id()
	}

	#[must_use]
	pub fn is_current(&self) -> bool {
		self.ticket.is_current()
	}

	/// Number of captured leaves.
	#[must_use]
	pub fn leaf_count(&self) -> usize {
		self.leaves.len()
	}

	#[must_use]
	pub fn processed(&self) -> usize {
		self.window.processed()
	}

	/// Markers produced so far.
	#[must_use]
	pub fn found(&self) -> usize {
		self.found
	}

	/// Scan the next chunk, highlighting the first match of every leaf.
	///
	/// The ticket is checked before each leaf so a superseded job stops
	/// without touching the document again.
	pub fn run_chunk(&mut self, document: &mut Document, store: &mut HighlightStore) -> ChunkOutcome {
		if !self.ticket.is_current() {
			return ChunkOutcome::Superseded;
		}
		let Some(range) = self.window.next_range() else {
			return ChunkOutcome::Finished;
		};
		tracing::trace!(job = self.ticket.id(), start = range.start, end = range.end, "scanning chunk");

		for leaf in &self.leaves[range] {
			if !self.ticket.is_current() {
				return ChunkOutcome::Superseded;
			}
			let Some(found) = self.pattern.find(&leaf.text) else {
				continue;
			};
			match store.materialize(document, leaf, found) {
				Ok(_) => self.found += 1,
				Err(error) => {
					tracing::debug!(job = self.ticket.id(), node = ?leaf.node, %error, "skipping leaf");
				}
			}
		}

		if self.window.is_exhausted() {
			ChunkOutcome::Finished
		} else {
			ChunkOutcome::Pending
		}
	}

	/// Scan every remaining chunk without yielding.
	pub fn run_to_completion(&mut self, document: &mut Document, store: &mut HighlightStore) -> ChunkOutcome {
		loop {
			match self.run_chunk(document, store) {
				ChunkOutcome::Pending => continue,
				outcome => return outcome,
			}
		}
	}

	/// Drive the job to completion, pausing between chunks so other tasks on
	/// the same control flow can run.
	///
	/// No borrow of `document` or `store` is held across a pause.
	pub async fn run(
		mut self,
		document: &RefCell<Document>,
		store: &RefCell<HighlightStore>,
		pause: Duration,
	) -> ChunkOutcome {
		loop {
			let outcome = {
				let mut document = document.borrow_mut();
				let mut store = store.borrow_mut();
				self.run_chunk(&mut document, &mut store)
			};
			match outcome {
				ChunkOutcome::Pending => pause_between_chunks(pause).await,
				outcome => {
					tracing::debug!(
						job = self.ticket.id(),
						leaves = self.leaves.len(),
						markers = self.found,
						?outcome,
						"scan ended"
					);
					return outcome;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use docfind_stream::Generation;

	use super::*;
	use crate::document::Element;
	use crate::search::pattern::{MatchOptions, Query};

	fn document_of(texts: &[&str]) -> Document {
		let mut document = Document::new("main");
		let root = document.root();
		for text in texts {
			let p = document.create_element(Element::new("p"));
			document.append_child(root, p).expect("append p");
			let leaf = document.create_text(*text);
			document.append_child(p, leaf).expect("append text");
		}
		document
	}

	fn fox() -> CompiledPattern {
		CompiledPattern::compile(&Query::new("fox", MatchOptions::default()))
	}

	#[test]
	fn one_marker_per_matching_leaf() {
		let mut document = document_of(&["The quick fox", "jumps", "over the fox"]);
		let mut store = HighlightStore::new();
		let generation = Generation::new();
		let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 50);

		assert_eq!(job.run_to_completion(&mut document, &mut store), ChunkOutcome::Finished);
		assert_eq!(job.found(), 2);
		assert_eq!(store.len(), 2);
	}

	#[test]
	fn only_the_first_occurrence_in_a_leaf_is_marked() {
		let mut document = document_of(&["fox and fox and fox"]);
		let mut store = HighlightStore::new();
		let generation = Generation::new();
		let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 50);
		job.run_to_completion(&mut document, &mut store);

		assert_eq!(store.len(), 1);
		insta::assert_snapshot!(document.to_markup(document.root()), @r#"<main><p><span class="search-highlight">fox</span> and fox and fox</p></main>"#);
	}

	#[test]
	fn chunks_advance_in_document_order() {
		let texts: Vec<String> = (0..7).map(|index| format!("fox {index}")).collect();
		let borrowed: Vec<&str> = texts.iter().map(String::as_str).collect();
		let mut document = document_of(&borrowed);
		let mut store = HighlightStore::new();
		let generation = Generation::new();
		let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 3);

		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Pending);
		assert_eq!(job.processed(), 3);
		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Pending);
		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Finished);

		let parents: Vec<_> = store.markers().iter().map(|marker| marker.parent()).collect();
		let expected: Vec<_> = document.children(document.root()).to_vec();
		assert_eq!(parents, expected);
	}

	#[test]
	fn superseded_job_stops_silently() {
		let mut document = document_of(&["fox", "fox", "fox", "fox"]);
		let mut store = HighlightStore::new();
		let generation = Generation::new();
		let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 2);

		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Pending);
		generation.advance();
		assert!(!job.is_current());
		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Superseded);
		assert_eq!(store.len(), 2);
	}

	#[test]
	fn empty_document_finishes_immediately() {
		let mut document = Document::new("main");
		let mut store = HighlightStore::new();
		let generation = Generation::new();
		let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 50);
		assert_eq!(job.leaf_count(), 0);
		assert_eq!(job.run_chunk(&mut document, &mut store), ChunkOutcome::Finished);
	}

	#[tokio::test(start_paused = true)]
	async fn async_driver_pauses_between_chunks() {
		let texts: Vec<String> = (0..120).map(|index| format!("leaf {index} fox")).collect();
		let borrowed: Vec<&str> = texts.iter().map(String::as_str).collect();
		let document = RefCell::new(document_of(&borrowed));
		let store = RefCell::new(HighlightStore::new());
		let generation = Generation::new();
		let job = {
			let document = document.borrow();
			BatchSearchJob::capture(&document, document.root(), generation.issue(), fox(), 50)
		};

		let start = tokio::time::Instant::now();
		let outcome = job.run(&document, &store, Duration::from_millis(10)).await;
		assert_eq!(outcome, ChunkOutcome::Finished);
		assert_eq!(store.borrow().len(), 120);
		assert!(start.elapsed() >= Duration::from_millis(20));
	}

	fn has_occurrence(text: &str, term: &str, options: MatchOptions) -> bool {
		let fold = |value: &str| {
			if options.case_sensitive {
				value.to_owned()
			} else {
				value.to_ascii_lowercase()
			}
		};
		let (haystack, needle) = (fold(text), fold(term));
		let bytes = haystack.as_bytes();
		(0..haystack.len())
			.filter(|&start| haystack[start..].starts_with(&needle))
			.any(|start| {
				let end = start + needle.len();
				!options.whole_words
					|| ((start == 0 || !bytes[start - 1].is_ascii_alphanumeric())
						&& (end == bytes.len() || !bytes[end].is_ascii_alphanumeric()))
			})
	}

	proptest::proptest! {
		#[test]
		fn marker_count_equals_matching_leaf_count(
			texts in proptest::collection::vec("[a-cA-C ]{0,12}", 0..10),
			term in "[a-cA-C]{2,3}",
			case_sensitive in proptest::bool::ANY,
			whole_words in proptest::bool::ANY,
		) {
			let options = MatchOptions { case_sensitive, whole_words };
			let borrowed: Vec<&str> = texts.iter().map(String::as_str).collect();
			let mut document = document_of(&borrowed);
			let expected = texts.iter().filter(|text| has_occurrence(text, &term, options)).count();

			let pattern = CompiledPattern::compile(&Query::new(&term, options));
			let mut store = HighlightStore::new();
			let generation = Generation::new();
			let mut job = BatchSearchJob::capture(&document, document.root(), generation.issue(), pattern, 4);

			proptest::prop_assert_eq!(job.run_to_completion(&mut document, &mut store), ChunkOutcome::Finished);
			proptest::prop_assert_eq!(store.len(), expected);
			proptest::prop_assert_eq!(job.found(), expected);
		}
	}
}
