use std::ops::Range;
use std::time::Duration;

/// Number of units processed before handing control back to the scheduler.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Pause inserted between chunks.
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_millis(10);

/// Sequential, non-overlapping windows over `0..total`.
#[derive(Clone, Debug)]
pub struct ChunkWindow {
	offset: usize,
	total: usize,
	size: usize,
}

impl ChunkWindow {
	/// Split `0..total` into windows of at most `size` units. A zero size is
	/// treated as one.
	#[must_use]
	pub fn new(total: usize, size: usize) -> Self {
		Self {
			offset: 0,
			total,
			size: size.max(1),
		}
	}

	/// Return the next window, or `None` once every unit has been handed out.
	pub fn next_range(&mut self) -> Option<Range<usize>> {
		if self.offset >= self.total {
			return None;
		}
		let end = (self.offset + self.size).min(self.total);
		let range = self.offset..end;
		self.offset = end;
		Some(range)
	}

	/// Units handed out so far.
	#[must_use]
	pub fn processed(&self) -> usize {
		self.offset
	}

	/// Total number of units covered by the windows.
	#[must_use]
	pub fn total(&self) -> usize {
		self.total
	}

	/// Maximum window length.
	#[must_use]
	pub fn size(&self) -> usize {
		self.size
	}

	/// Whether every window has been handed out.
	#[must_use]
	pub fn is_exhausted(&self) -> bool {
		self.offset >= self.total
	}
}

impl Iterator for ChunkWindow {
	type Item = Range<usize>;

	fn next(&mut self) -> Option<Self::Item> {
		self.next_range()
	}
}

/// Hand the control flow back to the scheduler between two chunks.
///
/// A zero pause still yields once so that other tasks on the same
/// `LocalSet` get a chance to run.
pub async fn pause_between_chunks(pause: Duration) {
	if pause.is_zero() {
		tokio::task::yield_now().await;
	} else {
		tokio::time::sleep(pause).await;
	}
}
