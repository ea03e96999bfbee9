use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use docfind_core::document::{Document, NodeId};
use docfind_core::export::{self, Clipboard, CopyTarget, ExportError, FlashTiming, StatusFlash};
use docfind_core::search::Position;
use docfind_core::toc::{self, SectionTracker, TocEntry};
use docfind_core::{MatchOption, Phase, SearchKey, SearchSession, SearchSettings, SearchUi};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::watch;
use tokio::time::Instant;

use super::input::QueryInput;
use super::layout::{self, Layout};
use super::theme::Theme;
use crate::clipboard::{NativeTools, Osc52};

/// Viewer tunables resolved from configuration.
#[derive(Debug, Clone)]
pub struct ViewerSettings {
	pub search: SearchSettings,
	pub flash: FlashTiming,
	/// Delay between two iterations of the event loop.
	pub tick: Duration,
	pub initial_query: Option<String>,
	/// Label shown before the query input.
	pub title: Option<String>,
	pub show_toc: bool,
}

impl Default for ViewerSettings {
	fn default() -> Self {
		Self {
			search: SearchSettings::default(),
			flash: FlashTiming::default(),
			tick: Duration::from_millis(16),
			initial_query: None,
			title: None,
			show_toc: true,
		}
	}
}

/// Latest values the session pushed, plus one-shot requests the viewer
/// consumes on its next iteration.
#[derive(Debug, Default)]
pub(crate) struct UiRequests {
	pub counter: String,
	pub navigation_visible: bool,
	pub processing: bool,
	pub case_sensitive: bool,
	pub whole_words: bool,
	reveal: Option<NodeId>,
	clear_input: bool,
	focus_input: bool,
}

/// [`SearchUi`] that records what the session asks for.
pub struct TerminalUi {
	requests: Rc<RefCell<UiRequests>>,
}

impl SearchUi for TerminalUi {
	fn set_counter(&mut self, counter: &str) {
		counter.clone_into(&mut self.requests.borrow_mut().counter);
	}

	fn set_navigation_visible(&mut self, visible: bool) {
		self.requests.borrow_mut().navigation_visible = visible;
	}

	fn reveal(&mut self, marker: NodeId) {
		self.requests.borrow_mut().reveal = Some(marker);
	}

	fn set_processing(&mut self, processing: bool) {
		self.requests.borrow_mut().processing = processing;
	}

	fn set_option_checked(&mut self, option: MatchOption, checked: bool) {
		let mut requests = self.requests.borrow_mut();
		match option {
			MatchOption::CaseSensitive => requests.case_sensitive = checked,
			MatchOption::WholeWords => requests.whole_words = checked,
		}
	}

	fn clear_input(&mut self) {
		self.requests.borrow_mut().clear_input = true;
	}

	fn focus_input(&mut self) {
		self.requests.borrow_mut().focus_input = true;
	}
}

/// Which pane receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
	Search,
	Document,
}

#[derive(Debug)]
pub(crate) struct Flash {
	pub status: StatusFlash,
	expires: Instant,
}

/// Viewer state: the shared document, its search session and the scroll
/// position over the laid out rows.
///
/// Construct and drive it inside a `tokio::task::LocalSet`.
pub struct Viewer {
	pub(crate) session: SearchSession<TerminalUi>,
	pub(crate) requests: Rc<RefCell<UiRequests>>,
	pub(crate) settings: ViewerSettings,
	pub(crate) theme: Theme,
	pub(crate) input: QueryInput,
	pub(crate) focus: Focus,
	pub(crate) layout: Layout,
	layout_width: usize,
	dirty: bool,
	pub(crate) scroll: usize,
	pub(crate) viewport_height: usize,
	pub(crate) tracker: SectionTracker,
	pub(crate) toc: Vec<TocEntry>,
	pub(crate) flash: Option<Flash>,
	pub(crate) throbber: ThrobberState,
	phase: watch::Receiver<Phase>,
	pending_reveal: Option<NodeId>,
	clipboards: (Box<dyn Clipboard>, Box<dyn Clipboard>),
	quit: bool,
}

impl Viewer {
	pub fn new(document: Document, settings: ViewerSettings) -> Self {
		let toc = toc::outline(&document);
		let root = document.root();
		let document = Rc::new(RefCell::new(document));
		let requests = Rc::new(RefCell::new(UiRequests::default()));
		let ui = TerminalUi {
			requests: Rc::clone(&requests),
		};
		let session = SearchSession::init(document, root, ui, settings.search);
		let phase = session.subscribe();
		let input = QueryInput::new(settings.initial_query.as_deref().unwrap_or_default());
		let mut viewer = Self {
			session,
			requests,
			settings,
			theme: Theme::default(),
			input,
			focus: Focus::Document,
			layout: Layout::default(),
			layout_width: 0,
			dirty: true,
			scroll: 0,
			viewport_height: 0,
			tracker: SectionTracker::default(),
			toc,
			flash: None,
			throbber: ThrobberState::default(),
			phase,
			pending_reveal: None,
			clipboards: (Box::new(Osc52), Box::new(NativeTools::default())),
			quit: false,
		};
		if !viewer.input.text().is_empty() {
			viewer.focus = Focus::Search;
			viewer.session.input(viewer.input.text());
		}
		viewer
	}

	/// Replace the primary and fallback clipboard mechanisms.
	#[must_use]
	pub fn with_clipboards(mut self, primary: Box<dyn Clipboard>, fallback: Box<dyn Clipboard>) -> Self {
		self.clipboards = (primary, fallback);
		self
	}

	pub fn should_quit(&self) -> bool {
		self.quit
	}

	pub fn session(&self) -> &SearchSession<TerminalUi> {
		&self.session
	}

	pub fn query(&self) -> &str {
		self.input.text()
	}

	pub fn focus(&self) -> Focus {
		self.focus
	}

	/// Fold in whatever happened since the last iteration: phase changes,
	/// session requests and expired status messages.
	pub fn tick(&mut self) {
		if self.phase.has_changed().unwrap_or(false) {
			let phase = *self.phase.borrow_and_update();
			tracing::trace!(%phase, "viewer observed phase");
			self.dirty = true;
		}
		if self.session.phase() == Phase::Scanning {
			self.dirty = true;
			self.throbber.calc_next();
		}
		self.drain_requests();
		if self
			.flash
			.as_ref()
			.is_some_and(|flash| Instant::now() >= flash.expires)
		{
			self.flash = None;
		}
	}

	fn drain_requests(&mut self) {
		let (reveal, clear, focus) = {
			let mut requests = self.requests.borrow_mut();
			(
				requests.reveal.take(),
				std::mem::take(&mut requests.clear_input),
				std::mem::take(&mut requests.focus_input),
			)
		};
		if let Some(marker) = reveal {
			self.pending_reveal = Some(marker);
			self.dirty = true;
		}
		if clear {
			self.input.clear();
			self.dirty = true;
		}
		if focus {
			self.focus = Focus::Search;
		}
	}

	/// Lay the document out for a viewport and settle the scroll position.
	pub(crate) fn prepare(&mut self, width: usize, height: usize) {
		if self.dirty || width != self.layout_width {
			let document = self.session.document();
			let document = document.borrow();
			self.layout = layout::layout(&document, document.root(), width);
			self.layout.sections.sort_by_key(|span| span.start);
			self.tracker = SectionTracker::new(self.layout.sections.clone());
			self.layout_width = width;
			self.dirty = false;
		}
		self.viewport_height = height;
		if let Some(marker) = self.pending_reveal.take()
			&& let Some(row) = self.layout.anchor(marker)
		{
			self.scroll = row.saturating_sub(height / 2);
		}
		self.scroll = self.scroll.min(self.max_scroll());
		self.tracker.update(self.scroll, height);
	}

	fn max_scroll(&self) -> usize {
		self.layout.height().saturating_sub(self.viewport_height.max(1))
	}

	fn scroll_by(&mut self, delta: isize) {
		self.scroll = self.scroll.saturating_add_signed(delta).min(self.max_scroll());
		self.tracker.update(self.scroll, self.viewport_height);
	}

	pub fn handle_key(&mut self, key: KeyEvent) {
		let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
		let alt = key.modifiers.contains(KeyModifiers::ALT);
		match key.code {
			KeyCode::Char('c') if ctrl => self.quit = true,
			KeyCode::Char('f') if ctrl => {
				self.session.handle_key(SearchKey::FocusSearch);
			}
			KeyCode::Char('c') if alt => self.toggle(MatchOption::CaseSensitive),
			KeyCode::Char('w') if alt => self.toggle(MatchOption::WholeWords),
			_ => match self.focus {
				Focus::Search => self.search_key(key, ctrl),
				Focus::Document => self.document_key(key),
			},
		}
		self.drain_requests();
	}

	fn search_key(&mut self, key: KeyEvent, ctrl: bool) {
		let changed = match key.code {
			KeyCode::Enter => {
				let reverse = key.modifiers.contains(KeyModifiers::SHIFT);
				self.session.handle_key(SearchKey::Enter { reverse });
				false
			}
			KeyCode::Esc => {
				if !self.session.handle_key(SearchKey::Escape) {
					self.focus = Focus::Document;
				}
				false
			}
			KeyCode::Tab | KeyCode::Down => {
				self.focus = Focus::Document;
				false
			}
			KeyCode::Backspace => self.input.backspace(),
			KeyCode::Delete => self.input.delete(),
			KeyCode::Char('w') if ctrl => self.input.delete_word(),
			KeyCode::Char('u') if ctrl => {
				let had_text = !self.input.text().is_empty();
				self.input.clear();
				had_text
			}
			KeyCode::Left => {
				self.input.left();
				false
			}
			KeyCode::Right => {
				self.input.right();
				false
			}
			KeyCode::Home => {
				self.input.home();
				false
			}
			KeyCode::End => {
				self.input.end();
				false
			}
			KeyCode::Char(ch) if !ctrl => {
				self.input.insert(ch);
				true
			}
			_ => false,
		};
		if changed {
			self.session.input(self.input.text());
		}
	}

	fn document_key(&mut self, key: KeyEvent) {
		let page = self.viewport_height.max(1) as isize;
		match key.code {
			KeyCode::Char('q') => self.quit = true,
			KeyCode::Char('/') => {
				self.session.handle_key(SearchKey::FocusSearch);
			}
			KeyCode::Esc => {
				self.session.handle_key(SearchKey::Escape);
			}
			KeyCode::Enter => {
				let reverse = key.modifiers.contains(KeyModifiers::SHIFT);
				self.session.handle_key(SearchKey::Enter { reverse });
			}
			KeyCode::Char('n') => {
				self.session.next();
			}
			KeyCode::Char('N') => {
				self.session.prev();
			}
			KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
			KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
			KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(page),
			KeyCode::PageUp => self.scroll_by(-page),
			KeyCode::Char('g') | KeyCode::Home => self.scroll_by(isize::MIN),
			KeyCode::Char('G') | KeyCode::End => self.scroll_by(isize::MAX),
			KeyCode::Char(']') => self.jump_section(true),
			KeyCode::Char('[') => self.jump_section(false),
			KeyCode::Char('c') => self.toggle(MatchOption::CaseSensitive),
			KeyCode::Char('w') => self.toggle(MatchOption::WholeWords),
			KeyCode::Char('y') => self.copy_section(CopyTarget::Trace),
			KeyCode::Char('Y') => self.copy_code_block(),
			KeyCode::Char('D') => self.copy_section(CopyTarget::Definition),
			_ => {}
		}
	}

	fn toggle(&mut self, option: MatchOption) {
		let enabled = self.session.toggle_option(option);
		tracing::debug!(?option, enabled, "match option toggled");
	}

	/// Move the current marker, as the previous/next controls do.
	pub fn navigate(&mut self, reverse: bool) -> Option<Position> {
		let position = if reverse {
			self.session.prev()
		} else {
			self.session.next()
		};
		self.drain_requests();
		position
	}

	/// Scroll to the start of the next (or previous) section.
	fn jump_section(&mut self, forward: bool) {
		let target = if forward {
			self.layout
				.sections
				.iter()
				.find(|span| span.start > self.scroll)
		} else {
			self.layout
				.sections
				.iter()
				.rev()
				.find(|span| span.start < self.scroll)
		};
		if let Some(id) = target.map(|span| span.id.clone()) {
			self.open_section(&id);
		}
	}

	/// Jump to a section of the table of contents, expanding it first.
	pub fn open_section(&mut self, id: &str) {
		let opened = {
			let document = self.session.document();
			let mut document = document.borrow_mut();
			toc::open_section(&mut document, id).is_some()
		};
		if !opened {
			return;
		}
		self.dirty = true;
		if self.layout_width > 0 {
			self.prepare(self.layout_width, self.viewport_height);
		}
		if let Some(row) = self.tracker.target(id) {
			self.scroll = row.min(self.max_scroll());
			self.tracker.update(self.scroll, self.viewport_height);
		}
	}

	/// Row the copy commands act around: the current marker, else the top of
	/// the viewport.
	fn focus_row(&self) -> usize {
		self.session
			.current_marker()
			.and_then(|marker| self.layout.anchor(marker))
			.unwrap_or(self.scroll)
	}

	fn copy_code_block(&mut self) {
		let row = self.focus_row();
		let bottom = self.scroll + self.viewport_height.max(1);
		let container = self
			.layout
			.code_blocks
			.iter()
			.find(|(_, rows)| rows.contains(&row))
			.or_else(|| {
				self.layout
					.code_blocks
					.iter()
					.find(|(_, rows)| rows.end > self.scroll && rows.start < bottom)
			})
			.map(|(node, _)| *node);
		let markdown = {
			let document = self.session.document();
			let document = document.borrow();
			container
				.ok_or(ExportError::NoCode)
				.and_then(|node| export::code_block_markdown(&document, node))
		};
		self.finish_copy(markdown);
	}

	fn copy_section(&mut self, target: CopyTarget) {
		let row = self.focus_row();
		let id = self
			.layout
			.sections
			.iter()
			.find(|span| span.start <= row && row < span.end)
			.map(|span| span.id.clone())
			.or_else(|| self.tracker.active().next().map(str::to_owned));
		let markdown = {
			let document = self.session.document();
			let document = document.borrow();
			id.and_then(|id| document.find_by_id(&id))
				.ok_or(ExportError::NoSection)
				.and_then(|section| export::section_markdown(&document, section, target))
		};
		self.finish_copy(markdown);
	}

	fn finish_copy(&mut self, markdown: Result<String, ExportError>) {
		let timing = self.settings.flash;
		let status = match markdown {
			Ok(text) => {
				let (primary, fallback) = &mut self.clipboards;
				export::copy_with_fallback(primary.as_mut(), fallback.as_mut(), &text, timing)
			}
			Err(error) => StatusFlash::from((error, timing)),
		};
		self.flash = Some(Flash {
			expires: Instant::now() + status.duration,
			status,
		});
	}
}
