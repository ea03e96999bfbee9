use std::fmt;

use serde::Serialize;

use super::highlight::HighlightStore;
use crate::document::{Document, NodeId};

/// Which marker a navigation step should land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	First,
	Next,
	Prev,
}

/// 1-based position of the current marker. `index` is 0 when nothing is
/// current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Position {
	pub index: usize,
	pub total: usize,
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.index, self.total)
	}
}

/// Cyclic cursor over the markers of a [`HighlightStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationCursor {
	current: Option<usize>,
}

impl NavigationCursor {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Index of the current marker.
	#[must_use]
	pub fn current(&self) -> Option<usize> {
		self.current
	}

	/// Forget the current marker without touching the document.
	pub fn reset(&mut self) {
		self.current = None;
	}

	/// Move to another marker, flag it current and ask the host to reveal it.
	///
	/// Returns `None` without side effects when there are no markers.
	pub fn navigate<F>(
		&mut self,
		document: &mut Document,
		store: &mut HighlightStore,
		direction: Direction,
		reveal: F,
	) -> Option<Position>
	where
		F: FnOnce(NodeId),
	{
		let total = store.len();
		if total == 0 {
			return None;
		}
		let previous = self.current.filter(|&index| index < total);
		let target = match (direction, previous) {
			(Direction::First, _) | (Direction::Next, None) => 0,
			(Direction::Next, Some(index)) => (index + 1) % total,
			(Direction::Prev, None) => total - 1,
			(Direction::Prev, Some(index)) => (index + total - 1) % total,
		};

		if let Some(index) = previous {
			store.set_current(document, index, false);
		}
		store.set_current(document, target, true);
		self.current = Some(target);
		if let Some(marker) = store.get(target) {
			reveal(marker.wrapper());
		}
		Some(self.position(total))
	}

	#[must_use]
	pub fn position(&self, total: usize) -> Position {
		let index = match self.current {
			Some(index) if index < total => index + 1,
			_ => 0,
		};
		Position { index, total }
	}

	/// Counter text shown next to the search input.
	#[must_use]
	pub fn counter(&self, total: usize) -> String {
		self.position(total).to_string()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::document::Element;
	use crate::search::highlight::CURRENT_CLASS;
	use crate::search::scanner::text_leaves;

	fn highlighted(count: usize) -> (Document, HighlightStore) {
		let mut document = Document::new("main");
		let root = document.root();
		for index in 0..count {
			let p = document.create_element(Element::new("p"));
			document.append_child(root, p).expect("append p");
			let text = document.create_text(format!("match {index}"));
			document.append_child(p, text).expect("append text");
		}
		let mut store = HighlightStore::new();
		let leaves: Vec<_> = text_leaves(&document, root).collect();
		for leaf in leaves {
			store.materialize(&mut document, &leaf, 0..5).expect("materialize");
		}
		(document, store)
	}

	#[test]
	fn empty_store_is_a_no_op() {
		let (mut document, mut store) = highlighted(0);
		let mut cursor = NavigationCursor::new();
		let mut revealed = false;
		let step = cursor.navigate(&mut document, &mut store, Direction::Next, |_| revealed = true);
		assert_eq!(step, None);
		assert!(!revealed);
		assert_eq!(cursor.counter(0), "0/0");
	}

	#[test]
	fn wraps_in_both_directions() {
		let (mut document, mut store) = highlighted(3);
		let mut cursor = NavigationCursor::new();
		let mut step = |cursor: &mut NavigationCursor, direction| {
			cursor
				.navigate(&mut document, &mut store, direction, |_| {})
				.map(|position| position.to_string())
		};

		assert_eq!(step(&mut cursor, Direction::First).as_deref(), Some("1/3"));
		assert_eq!(step(&mut cursor, Direction::Prev).as_deref(), Some("3/3"));
		assert_eq!(step(&mut cursor, Direction::Next).as_deref(), Some("1/3"));
		assert_eq!(step(&mut cursor, Direction::Next).as_deref(), Some("2/3"));
	}

	#[test]
	fn only_one_marker_is_current() {
		let (mut document, mut store) = highlighted(3);
		let mut cursor = NavigationCursor::new();
		let mut revealed = Vec::new();
		for direction in [Direction::First, Direction::Next, Direction::Next] {
			cursor.navigate(&mut document, &mut store, direction, |node| revealed.push(node));
		}

		let current: Vec<_> = store
			.markers()
			.iter()
			.filter(|marker| marker.is_current())
			.map(|marker| marker.wrapper())
			.collect();
		assert_eq!(current, vec![store.markers()[2].wrapper()]);
		assert_eq!(document.find_by_class(document.root(), CURRENT_CLASS), current);
		assert_eq!(revealed.last(), current.first());
	}

	#[test]
	fn counter_without_current_marker() {
		let cursor = NavigationCursor::new();
		assert_eq!(cursor.counter(4), "0/4");
	}

	proptest! {
		#[test]
		fn cycling_returns_to_start(count in 1usize..12, start in 0usize..12, prev in any::<bool>()) {
			let (mut document, mut store) = highlighted(count);
			let mut cursor = NavigationCursor::new();
			cursor.navigate(&mut document, &mut store, Direction::First, |_| {});
			for _ in 0..start % count {
				cursor.navigate(&mut document, &mut store, Direction::Next, |_| {});
			}
			let origin = cursor.current();
			let direction = if prev { Direction::Prev } else { Direction::Next };
			for _ in 0..count {
				cursor.navigate(&mut document, &mut store, direction, |_| {});
			}
			prop_assert_eq!(cursor.current(), origin);
		}
	}
}
