//! Single-line query input.

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
	text: String,
	/// Byte offset of the cursor, always on a char boundary.
	cursor: usize,
}

impl QueryInput {
	pub fn new(initial: &str) -> Self {
		Self {
			text: initial.to_owned(),
			cursor: initial.len(),
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// Display column of the cursor.
	pub fn cursor_column(&self) -> usize {
		self.text[..self.cursor].width()
	}

	pub fn insert(&mut self, ch: char) {
		self.text.insert(self.cursor, ch);
		self.cursor += ch.len_utf8();
	}

	/// Delete the char before the cursor. Returns whether the text changed.
	pub fn backspace(&mut self) -> bool {
		let Some(ch) = self.text[..self.cursor].chars().next_back() else {
			return false;
		};
		self.cursor -= ch.len_utf8();
		self.text.remove(self.cursor);
		true
	}

	/// Delete the char under the cursor.
	pub fn delete(&mut self) -> bool {
		if self.cursor == self.text.len() {
			return false;
		}
		self.text.remove(self.cursor);
		true
	}

	/// Delete the word before the cursor.
	pub fn delete_word(&mut self) -> bool {
		let before = &self.text[..self.cursor];
		let start = before
			.trim_end()
			.rfind(char::is_whitespace)
			.map_or(0, |index| index + 1);
		if start == self.cursor {
			return false;
		}
		self.text.replace_range(start..self.cursor, "");
		self.cursor = start;
		true
	}

	pub fn left(&mut self) {
		if let Some(ch) = self.text[..self.cursor].chars().next_back() {
			self.cursor -= ch.len_utf8();
		}
	}

	pub fn right(&mut self) {
		if let Some(ch) = self.text[self.cursor..].chars().next() {
			self.cursor += ch.len_utf8();
		}
	}

	pub fn home(&mut self) {
		self.cursor = 0;
	}

	pub fn end(&mut self) {
		self.cursor = self.text.len();
	}

	pub fn clear(&mut self) {
		self.text.clear();
		self.cursor = 0;
	}
}
