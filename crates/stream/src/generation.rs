use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic counter identifying the most recent request.
///
/// Cloning a `Generation` shares the counter, so a timer and a scan that were
/// issued from the same generation are retired together by a single
/// [`Generation::advance`].
#[derive(Clone, Debug, Default)]
pub struct Generation {
	latest: Arc<AtomicU64>,
}

impl Generation {
	/// Create a counter with no request issued yet.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Retire every outstanding ticket and return the new identifier.
	pub fn advance(&self) -> u64 {
		self.latest.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Retire every outstanding ticket and hand out a ticket for the new request.
	pub fn issue(&self) -> Ticket {
		let id = self.advance();
		Ticket {
			id,
			latest: Arc::clone(&self.latest),
		}
	}

	/// Identifier of the most recent request.
	#[must_use]
	pub fn current(&self) -> u64 {
		self.latest.load(Ordering::Acquire)
	}

	/// Whether `id` still identifies the most recent request.
	#[must_use]
	pub fn is_current(&self, id: u64) -> bool {
		!should_abort(id, &self.latest)
	}
}

/// Proof that a unit of work belongs to a particular request.
#[derive(Clone, Debug)]
pub struct Ticket {
	id: u64,
	latest: Arc<AtomicU64>,
}

impl Ticket {
	/// Identifier of the request this ticket was issued for.
	#[must_use]
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Whether no newer request has been issued since this ticket.
	#[must_use]
	pub fn is_current(&self) -> bool {
		!should_abort(self.id, &self.latest)
	}
}

/// Check if the request `id` has been superseded by a newer one.
pub fn should_abort(id: u64, latest: &AtomicU64) -> bool {
	latest.load(Ordering::Acquire) != id
}
