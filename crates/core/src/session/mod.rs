//! Search session: the state machine that ties debounced input, match options
//! and navigation to the search building blocks.
//!
//! ```text
//! Idle/Settled --input--> Debouncing --timer--> Scanning --done--> Settled
//!       ^                      |                     |
//!       +-- short input / clear (Cancelled) ---------+
//! ```
//!
//! A session runs on a single control flow: it must be driven from inside a
//! `tokio::task::LocalSet`, where the debounce timer and the chunked scan are
//! spawned as local tasks. Every pending timer and in-flight job is tagged with
//! a ticket from one shared [`Generation`], so any transition simply advances
//! the generation and the stale work notices on its next check.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use docfind_stream::{DEFAULT_CHUNK_PAUSE, DEFAULT_CHUNK_SIZE, DEFAULT_DEBOUNCE, Debouncer, Generation};
use serde::Serialize;
use tokio::sync::watch;

use crate::document::{Document, NodeId};
use crate::search::{
	BatchSearchJob, ChunkOutcome, CompiledPattern, Direction, HighlightStore, MIN_TERM_CHARS,
	MatchOptions, NavigationCursor, Position, Query,
};

mod ui;

pub use ui::{MatchOption, SearchKey, SearchUi};

/// Tunables of a [`SearchSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSettings {
	pub debounce: Duration,
	pub chunk_size: usize,
	pub chunk_pause: Duration,
	pub min_term_chars: usize,
	pub options: MatchOptions,
}

impl Default for SearchSettings {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
			chunk_size: DEFAULT_CHUNK_SIZE,
			chunk_pause: DEFAULT_CHUNK_PAUSE,
			min_term_chars: MIN_TERM_CHARS,
			options: MatchOptions::default(),
		}
	}
}

/// Observable state of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
	#[default]
	Idle,
	Debouncing,
	Scanning,
	Settled,
	/// Pending or running work was abandoned by a clear or a short input.
	/// Published on the way back to [`Phase::Idle`].
	Cancelled,
}

impl Phase {
	/// Whether a timer or a scan is outstanding.
	#[must_use]
	pub fn is_busy(self) -> bool {
		matches!(self, Self::Debouncing | Self::Scanning)
	}
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Idle => "idle",
			Self::Debouncing => "debouncing",
			Self::Scanning => "scanning",
			Self::Settled => "settled",
			Self::Cancelled => "cancelled",
		};
		f.write_str(label)
	}
}

/// Point-in-time view of the session state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchSnapshot {
	pub phase: Phase,
	pub active: bool,
	pub term: String,
	pub options: MatchOptions,
	pub markers: usize,
	/// 0-based index of the current marker.
	pub current: Option<usize>,
	pub processing: bool,
}

#[derive(Debug, Default)]
struct SearchState {
	active: bool,
	query: Query,
	options: MatchOptions,
	processing: bool,
	cursor: NavigationCursor,
}

struct Inner<U> {
	document: Rc<RefCell<Document>>,
	root: NodeId,
	ui: RefCell<U>,
	settings: SearchSettings,
	state: RefCell<SearchState>,
	store: RefCell<HighlightStore>,
	generation: Generation,
	debouncer: Debouncer,
	phase: watch::Sender<Phase>,
	disposed: Cell<bool>,
}

/// Incremental search over one subtree of a shared document.
pub struct SearchSession<U: SearchUi + 'static> {
	inner: Rc<Inner<U>>,
}

impl<U: SearchUi + 'static> SearchSession<U> {
	/// Bind a session to `root` inside `document` and push the initial UI
	/// state (unchecked options unless configured, hidden navigation, `0/0`).
	pub fn init(document: Rc<RefCell<Document>>, root: NodeId, ui: U, settings: SearchSettings) -> Self {
		let generation = Generation::new();
		let debouncer = Debouncer::new(settings.debounce, generation.clone());
		let (phase, _) = watch::channel(Phase::Idle);
		let inner = Rc::new(Inner {
			document,
			root,
			ui: RefCell::new(ui),
			settings,
			state: RefCell::new(SearchState {
				options: settings.options,
				..SearchState::default()
			}),
			store: RefCell::new(HighlightStore::new()),
			generation,
			debouncer,
			phase,
			disposed: Cell::new(false),
		});
		{
			let mut ui = inner.ui.borrow_mut();
			ui.set_option_checked(MatchOption::CaseSensitive, settings.options.case_sensitive);
			ui.set_option_checked(MatchOption::WholeWords, settings.options.whole_words);
			ui.set_navigation_visible(false);
			ui.set_counter(&NavigationCursor::new().counter(0));
		}
		tracing::debug!(root = ?root, ?settings, "search session initialised");
		Self { inner }
	}

	/// Cancel outstanding work and restore the document. The session ignores
	/// every later call.
	pub fn dispose(&self) {
		if self.inner.disposed.replace(true) {
			return;
		}
		self.inner.reset();
		tracing::debug!("search session disposed");
	}

	/// React to the content of the query input changing.
	pub fn input(&self, raw: &str) {
		if self.inner.disposed.get() {
			return;
		}
		Inner::input(&self.inner, raw);
	}

	/// Toggle a match option. An active search is rescanned immediately.
	pub fn set_option(&self, option: MatchOption, enabled: bool) {
		if self.inner.disposed.get() {
			return;
		}
		Inner::set_option(&self.inner, option, enabled);
	}

	/// Flip a match option and return its new value.
	pub fn toggle_option(&self, option: MatchOption) -> bool {
		let options = self.inner.state.borrow().options;
		let enabled = !match option {
			MatchOption::CaseSensitive => options.case_sensitive,
			MatchOption::WholeWords => options.whole_words,
		};
		self.set_option(option, enabled);
		enabled
	}

	/// Clear the input and the search, restoring the document.
	pub fn clear(&self) {
		if self.inner.disposed.get() {
			return;
		}
		self.inner.ui.borrow_mut().clear_input();
		self.inner.reset();
	}

	pub fn next(&self) -> Option<Position> {
		self.navigate(Direction::Next)
	}

	pub fn prev(&self) -> Option<Position> {
		self.navigate(Direction::Prev)
	}

	pub fn first(&self) -> Option<Position> {
		self.navigate(Direction::First)
	}

	/// Move the current marker. A no-op without markers.
	pub fn navigate(&self, direction: Direction) -> Option<Position> {
		if self.inner.disposed.get() {
			return None;
		}
		self.inner.navigate(direction)
	}

	/// Dispatch a key. Returns whether the key was consumed.
	pub fn handle_key(&self, key: SearchKey) -> bool {
		if self.inner.disposed.get() {
			return false;
		}
		match key {
			SearchKey::FocusSearch => {
				self.inner.ui.borrow_mut().focus_input();
				true
			}
			SearchKey::Enter { reverse } => {
				self.navigate(if reverse { Direction::Prev } else { Direction::Next });
				true
			}
			SearchKey::Escape => {
				let engaged = self.inner.state.borrow().active || self.phase() != Phase::Idle;
				self.clear();
				engaged
			}
		}
	}

	#[must_use]
	pub fn phase(&self) -> Phase {
		*self.inner.phase.borrow()
	}

	/// Receiver notified on every phase change.
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<Phase> {
		self.inner.phase.subscribe()
	}

	/// Counter text for the current state.
	#[must_use]
	pub fn counter(&self) -> String {
		let total = self.inner.store.borrow().len();
		self.inner.state.borrow().cursor.counter(total)
	}

	#[must_use]
	pub fn snapshot(&self) -> SearchSnapshot {
		let state = self.inner.state.borrow();
		SearchSnapshot {
			phase: self.phase(),
			active: state.active,
			term: state.query.term().to_owned(),
			options: state.options,
			markers: self.inner.store.borrow().len(),
			current: state.cursor.current(),
			processing: state.processing,
		}
	}

	/// Highlight wrappers in document order.
	#[must_use]
	pub fn markers(&self) -> Vec<NodeId> {
		self.inner
			.store
			.borrow()
			.markers()
			.iter()
			.map(|marker| marker.wrapper())
			.collect()
	}

	/// Wrapper of the current marker.
	#[must_use]
	pub fn current_marker(&self) -> Option<NodeId> {
		let index = self.inner.state.borrow().cursor.current()?;
		self.inner.store.borrow().get(index).map(|marker| marker.wrapper())
	}

	#[must_use]
	pub fn document(&self) -> Rc<RefCell<Document>> {
		Rc::clone(&self.inner.document)
	}

	#[must_use]
	pub fn ui(&self) -> Ref<'_, U> {
		self.inner.ui.borrow()
	}

	#[must_use]
	pub fn settings(&self) -> SearchSettings {
		self.inner.settings
	}
}

impl<U: SearchUi + 'static> Drop for SearchSession<U> {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl<U: SearchUi + 'static> Inner<U> {
	fn input(this: &Rc<Self>, raw: &str) {
		let term = raw.trim();
		if term.chars().count() < this.settings.min_term_chars.max(1) {
			this.reset();
			return;
		}

		let was_processing = std::mem::replace(&mut this.state.borrow_mut().processing, false);
		if was_processing {
			this.ui.borrow_mut().set_processing(false);
		}

		let weak = Rc::downgrade(this);
		let term = term.to_owned();
		let ticket = this.debouncer.arm(move || {
			if let Some(inner) = weak.upgrade() {
				Inner::fire(&inner, &term);
			}
		});
		tracing::trace!(ticket = ticket.id(), "input debounced");
		this.publish(Phase::Debouncing);
	}

	fn fire(this: &Rc<Self>, term: &str) {
		{
			let mut state = this.state.borrow_mut();
			state.active = true;
			state.query = Query::new(term, state.options);
		}
		Inner::begin_scan(this);
	}

	fn set_option(this: &Rc<Self>, option: MatchOption, enabled: bool) {
		let rescan = {
			let mut state = this.state.borrow_mut();
			match option {
				MatchOption::CaseSensitive => state.options.case_sensitive = enabled,
				MatchOption::WholeWords => state.options.whole_words = enabled,
			}
			// A pending timer already reads the new options when it fires.
			state.active && *this.phase.borrow() != Phase::Debouncing
		};
		this.ui.borrow_mut().set_option_checked(option, enabled);
		if rescan {
			{
				let mut state = this.state.borrow_mut();
				state.query = state.query.with_options(state.options);
			}
			Inner::begin_scan(this);
		}
	}

	fn begin_scan(this: &Rc<Self>) {
		let ticket = this.generation.issue();
		let query = {
			let mut state = this.state.borrow_mut();
			state.processing = true;
			state.cursor.reset();
			state.query.clone()
		};
		let job = {
			let mut document = this.document.borrow_mut();
			this.store.borrow_mut().restore_all(&mut document);
			let pattern = CompiledPattern::compile(&query);
			BatchSearchJob::capture(&document, this.root, ticket, pattern, this.settings.chunk_size)
		};
		tracing::debug!(
			job = job.id(),
			term = query.term(),
			leaves = job.leaf_count(),
			"scan started"
		);
		this.ui.borrow_mut().set_processing(true);
		this.publish(Phase::Scanning);

		let inner = Rc::clone(this);
		tokio::task::spawn_local(async move {
			let outcome = job
				.run(&inner.document, &inner.store, inner.settings.chunk_pause)
				.await;
			if outcome == ChunkOutcome::Finished {
				inner.finish();
			}
		});
	}

	fn finish(&self) {
		self.state.borrow_mut().processing = false;
		let total = self.store.borrow().len();
		{
			let mut ui = self.ui.borrow_mut();
			ui.set_processing(false);
			ui.set_navigation_visible(total > 0);
			ui.set_counter(&self.state.borrow().cursor.counter(total));
		}
		self.publish(Phase::Settled);
		if total > 0 {
			self.navigate(Direction::First);
		}
	}

	fn navigate(&self, direction: Direction) -> Option<Position> {
		let mut revealed = None;
		let position = {
			let mut document = self.document.borrow_mut();
			let mut store = self.store.borrow_mut();
			let mut state = self.state.borrow_mut();
			state
				.cursor
				.navigate(&mut document, &mut store, direction, |node| revealed = Some(node))?
		};
		let mut ui = self.ui.borrow_mut();
		if let Some(node) = revealed {
			ui.reveal(node);
		}
		ui.set_counter(&position.to_string());
		Some(position)
	}

	/// Drop back to an inactive state, retiring timers and jobs and restoring
	/// the document.
	fn reset(&self) {
		self.generation.advance();
		let busy = self.phase.borrow().is_busy();
		let was_processing = {
			let mut state = self.state.borrow_mut();
			let was_processing = state.processing;
			let options = state.options;
			*state = SearchState {
				options,
				..SearchState::default()
			};
			was_processing
		};
		let restored = {
			let mut document = self.document.borrow_mut();
			self.store.borrow_mut().restore_all(&mut document)
		};
		if restored > 0 {
			tracing::debug!(markers = restored, "highlights restored");
		}
		{
			let mut ui = self.ui.borrow_mut();
			if was_processing {
				ui.set_processing(false);
			}
			ui.set_navigation_visible(false);
			ui.set_counter(&NavigationCursor::new().counter(0));
		}
		if busy {
			self.publish(Phase::Cancelled);
		}
		self.publish(Phase::Idle);
	}

	fn publish(&self, phase: Phase) {
		let previous = self.phase.send_replace(phase);
		if previous != phase {
			tracing::trace!(from = %previous, to = %phase, "search phase");
		}
	}
}
