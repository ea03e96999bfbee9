use std::time::Duration;

use crate::generation::{Generation, Ticket};

/// Delay applied when no explicit debounce interval is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Pure debounce timer: every [`arm`](Debouncer::arm) supersedes the previous
/// one, so only the most recent action fires.
///
/// The debouncer shares its [`Generation`] with whatever else the caller
/// tags, which lets a single `advance` cancel a pending timer and an
/// in-flight job at the same time.
#[derive(Clone, Debug)]
pub struct Debouncer {
	delay: Duration,
	generation: Generation,
}

impl Debouncer {
	/// Create a debouncer that fires `delay` after the most recent arm.
	#[must_use]
	pub fn new(delay: Duration, generation: Generation) -> Self {
		Self { delay, generation }
	}

	/// Interval between the last arm and the action firing.
	#[must_use]
	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Schedule `action` on the current `LocalSet`.
	///
	/// The action runs after the delay unless a newer ticket was issued from
	/// the shared generation in the meantime.
	///
	/// # Panics
	///
	/// Panics when called outside of a `tokio::task::LocalSet` context.
	pub fn arm<F>(&self, action: F) -> Ticket
	where
		F: FnOnce() + 'static,
	{
		let ticket = self.generation.issue();
		let guard = ticket.clone();
		let delay = self.delay;
		tokio::task::spawn_local(async move {
			tokio::time::sleep(delay).await;
			if guard.is_current() {
				action();
			}
		});
		ticket
	}

	/// Retire any pending action without scheduling a new one.
	pub fn cancel(&self) {
		self.generation.advance();
	}
}
