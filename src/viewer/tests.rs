use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use docfind_core::document::from_text;
use docfind_core::export::{Clipboard, ClipboardError, FlashKind};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::task::LocalSet;

use super::*;

const SAMPLE: &str = "# Intro\n\nThe quick brown fox\n\n# Usage\n\nJump over the fox\n\nmore\n\nand more\n\nstill more\n\n```\nfox --help\n```";

struct RecordingClipboard {
	fail: bool,
	copied: Rc<RefCell<Vec<String>>>,
}

impl Clipboard for RecordingClipboard {
	fn name(&self) -> &str {
		"recording"
	}

	fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
		if self.fail {
			return Err(ClipboardError::Unavailable);
		}
		self.copied.borrow_mut().push(text.to_owned());
		Ok(())
	}
}

fn viewer(settings: ViewerSettings) -> Viewer {
	Viewer::new(from_text(SAMPLE).expect("document"), settings)
}

fn key(code: KeyCode) -> KeyEvent {
	KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(viewer: &mut Viewer, text: &str) {
	for ch in text.chars() {
		viewer.handle_key(key(KeyCode::Char(ch)));
	}
}

async fn settle(viewer: &mut Viewer) {
	for _ in 0..200 {
		tokio::time::sleep(Duration::from_millis(10)).await;
		viewer.tick();
		if !viewer.session().phase().is_busy() {
			return;
		}
	}
	panic!("search did not settle");
}

fn render(viewer: &mut Viewer, width: u16, height: u16) -> Vec<String> {
	let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
	terminal.draw(|frame| viewer.draw(frame)).expect("draw");
	let buffer = terminal.backend().buffer();
	(0..height)
		.map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
		.collect()
}

#[tokio::test(start_paused = true)]
async fn typing_highlights_and_counts_matches() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = viewer(ViewerSettings::default());
			viewer.handle_key(key(KeyCode::Char('/')));
			assert_eq!(viewer.focus(), Focus::Search);

			type_text(&mut viewer, "fox");
			settle(&mut viewer).await;
			assert_eq!(viewer.session().counter(), "1/3");

			let screen = render(&mut viewer, 80, 24);
			assert!(screen[0].contains("1/3"), "{:?}", screen[0]);
			assert!(screen[0].contains("fox"));
			assert!(screen.iter().any(|row| row.contains("Contents")));

			viewer.handle_key(key(KeyCode::Enter));
			assert_eq!(viewer.session().counter(), "2/3");
			viewer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
			viewer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
			assert_eq!(viewer.session().counter(), "3/3");
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn escape_clears_then_leaves_the_input() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = viewer(ViewerSettings {
				initial_query: Some("more".into()),
				..ViewerSettings::default()
			});
			assert_eq!(viewer.focus(), Focus::Search);
			settle(&mut viewer).await;
			assert_eq!(viewer.session().markers().len(), 3);

			viewer.handle_key(key(KeyCode::Esc));
			assert_eq!(viewer.query(), "");
			assert!(viewer.session().markers().is_empty());
			assert_eq!(viewer.focus(), Focus::Search);

			viewer.handle_key(key(KeyCode::Esc));
			assert_eq!(viewer.focus(), Focus::Document);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn option_toggles_rescan_the_active_search() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = viewer(ViewerSettings {
				initial_query: Some("jump".into()),
				..ViewerSettings::default()
			});
			settle(&mut viewer).await;
			assert_eq!(viewer.session().markers().len(), 1);

			viewer.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::ALT));
			settle(&mut viewer).await;
			assert!(viewer.requests.borrow().case_sensitive);
			assert!(viewer.session().markers().is_empty());
			assert_eq!(viewer.session().counter(), "0/0");
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn section_keys_scroll_to_section_starts() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = viewer(ViewerSettings::default());
			render(&mut viewer, 80, 8);
			assert_eq!(viewer.scroll, 0);

			viewer.handle_key(key(KeyCode::Char(']')));
			let usage = viewer.tracker.target("usage").expect("usage section");
			assert_eq!(viewer.scroll, usage);
			assert!(viewer.tracker.is_active("usage"));

			viewer.handle_key(key(KeyCode::Char('[')));
			assert_eq!(viewer.scroll, 0);
			assert!(viewer.tracker.is_active("intro"));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn copying_falls_back_and_flashes() {
	LocalSet::new()
		.run_until(async {
			let copied = Rc::new(RefCell::new(Vec::new()));
			let mut viewer = viewer(ViewerSettings::default()).with_clipboards(
				Box::new(RecordingClipboard {
					fail: true,
					copied: Rc::clone(&copied),
				}),
				Box::new(RecordingClipboard {
					fail: false,
					copied: Rc::clone(&copied),
				}),
			);
			render(&mut viewer, 80, 30);

			viewer.handle_key(key(KeyCode::Char('Y')));
			assert_eq!(copied.borrow().as_slice(), ["```blueprint\nfox --help\n```"]);
			let flash = viewer.flash.as_ref().expect("flash");
			assert_eq!(flash.status.kind, FlashKind::Success);
			assert_eq!(flash.status.message, "Copied!");

			let screen = render(&mut viewer, 80, 30);
			assert!(screen[29].contains("Copied!"));

			tokio::time::sleep(Duration::from_millis(2100)).await;
			viewer.tick();
			assert!(viewer.flash.is_none());

			viewer.handle_key(key(KeyCode::Char('y')));
			assert!(copied.borrow()[1].starts_with("### Intro"));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn copy_failure_reports_an_error() {
	LocalSet::new()
		.run_until(async {
			let copied = Rc::new(RefCell::new(Vec::new()));
			let failing = || {
				Box::new(RecordingClipboard {
					fail: true,
					copied: Rc::clone(&copied),
				})
			};
			let mut viewer = viewer(ViewerSettings::default()).with_clipboards(failing(), failing());
			render(&mut viewer, 80, 30);

			viewer.handle_key(key(KeyCode::Char('D')));
			let flash = viewer.flash.as_ref().expect("flash");
			assert_eq!(flash.status.kind, FlashKind::Error);
			assert_eq!(flash.status.message, "Copy failed");
			assert!(copied.borrow().is_empty());
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn copying_without_code_in_view_reports_no_code() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = Viewer::new(from_text("# Intro\n\nplain text").expect("document"), ViewerSettings::default());
			render(&mut viewer, 80, 20);
			viewer.handle_key(key(KeyCode::Char('Y')));
			let flash = viewer.flash.as_ref().expect("flash");
			assert_eq!(flash.status.message, "No code");
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn quit_keys() {
	LocalSet::new()
		.run_until(async {
			let mut viewer = viewer(ViewerSettings::default());
			viewer.handle_key(key(KeyCode::Char('/')));
			viewer.handle_key(key(KeyCode::Char('q')));
			assert!(!viewer.should_quit());
			assert_eq!(viewer.query(), "q");

			viewer.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
			assert!(viewer.should_quit());
		})
		.await;
}
