use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use docfind_core::document::Document;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::task::LocalSet;

use super::state::{Viewer, ViewerSettings};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Open the viewer on `document` and block until the user quits.
pub fn run(document: Document, settings: ViewerSettings) -> Result<()> {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.build()?;
	let local = LocalSet::new();
	local.block_on(&runtime, event_loop(document, settings))
}

async fn event_loop(document: Document, settings: ViewerSettings) -> Result<()> {
	let tick = settings.tick;
	let mut viewer = Viewer::new(document, settings);
	let mut terminal = ratatui::init();
	terminal.clear()?;

	let (event_tx, event_rx) = mpsc::channel();
	let event_loop_running = Arc::new(AtomicBool::new(true));
	let event_loop_flag = Arc::clone(&event_loop_running);

	let event_thread = thread::spawn(move || -> Result<()> {
		while event_loop_flag.load(Ordering::Relaxed) {
			if event::poll(POLL_INTERVAL)? {
				let event = event::read()?;
				if event_tx.send(event).is_err() {
					break;
				}
			}
		}
		Ok(())
	});

	let result: Result<()> = 'event_loop: loop {
		viewer.tick();

		loop {
			match event_rx.try_recv() {
				Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => viewer.handle_key(key),
				Ok(_) => {}
				Err(mpsc::TryRecvError::Empty) => break,
				Err(mpsc::TryRecvError::Disconnected) => {
					break 'event_loop Err(anyhow!("input event channel disconnected"));
				}
			}
			if viewer.should_quit() {
				break 'event_loop Ok(());
			}
		}

		if let Err(err) = terminal.draw(|frame| viewer.draw(frame)) {
			break Err(err.into());
		}

		// Yields to the debounce timer and the scan running on this LocalSet.
		tokio::time::sleep(tick).await;
	};

	ratatui::restore();
	drop(viewer);

	event_loop_running.store(false, Ordering::Relaxed);
	match event_thread.join() {
		Ok(join_result) => join_result?,
		Err(err) => std::panic::resume_unwind(err),
	}

	result
}
