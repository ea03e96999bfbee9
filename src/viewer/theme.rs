use ratatui::style::{Color, Modifier, Style};

use super::layout::Tone;

/// Styles used by the viewer.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
	/// Search bar and table of contents header.
	pub header: Style,
	pub prompt: Style,
	/// Muted text: counters, hints, inactive toggles.
	pub empty: Style,
	pub heading: Style,
	pub code: Style,
	/// Every highlight wrapper.
	pub highlight: Style,
	/// The highlight wrapper the cursor is on.
	pub current: Style,
	pub toggle_on: Style,
	/// Active entries of the table of contents.
	pub active_section: Style,
	pub success: Style,
	pub error: Style,
}

pub const SLATE: Theme = Theme {
	header: Style::new()
		.fg(Color::Rgb(226, 232, 240))
		.bg(Color::Rgb(15, 23, 42)),
	prompt: Style::new().fg(Color::LightCyan),
	empty: Style::new().fg(Color::DarkGray),
	heading: Style::new()
		.fg(Color::Rgb(226, 232, 240))
		.add_modifier(Modifier::BOLD),
	code: Style::new().fg(Color::Rgb(148, 163, 184)),
	highlight: Style::new()
		.fg(Color::Black)
		.bg(Color::Rgb(250, 204, 21)),
	current: Style::new()
		.fg(Color::Black)
		.bg(Color::Rgb(249, 115, 22))
		.add_modifier(Modifier::BOLD),
	toggle_on: Style::new()
		.fg(Color::Yellow)
		.add_modifier(Modifier::BOLD),
	active_section: Style::new()
		.bg(Color::Rgb(30, 41, 59))
		.fg(Color::Rgb(250, 204, 21)),
	success: Style::new().fg(Color::Green),
	error: Style::new().fg(Color::Red),
};

impl Default for Theme {
	fn default() -> Self {
		SLATE
	}
}

impl Theme {
	#[must_use]
	pub fn tone(&self, tone: Tone) -> Style {
		match tone {
			Tone::Plain => Style::new(),
			Tone::Heading => self.heading,
			Tone::Code => self.code,
			Tone::Highlight => self.highlight,
			Tone::Current => self.current,
		}
	}
}
