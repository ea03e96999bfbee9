use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use throbber_widgets_tui::Throbber;
use unicode_width::UnicodeWidthStr;

use docfind_core::export::FlashKind;

use super::state::{Focus, Viewer};

const TOC_WIDTH: u16 = 28;
/// Narrower terminals hide the table of contents.
const TOC_MIN_TOTAL_WIDTH: u16 = 72;
const HINTS: &str = "/ search  n/N next/prev  [ ] sections  y section  Y code  D definition  c/w options  q quit";

impl Viewer {
	pub fn draw(&mut self, frame: &mut Frame) {
		let area = frame.area().inner(Margin {
			vertical: 0,
			horizontal: 1,
		});
		let rows = Layout::default()
			.direction(Direction::Vertical)
			.constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
			.split(area);

		let show_toc = self.settings.show_toc && !self.toc.is_empty() && area.width >= TOC_MIN_TOTAL_WIDTH;
		let body = if show_toc {
			Layout::default()
				.direction(Direction::Horizontal)
				.constraints([Constraint::Length(TOC_WIDTH), Constraint::Min(1)])
				.split(rows[1])
		} else {
			Layout::default()
				.direction(Direction::Horizontal)
				.constraints([Constraint::Length(0), Constraint::Min(1)])
				.split(rows[1])
		};

		// One column is reserved for the scrollbar.
		let document_area = body[1];
		let text_width = document_area.width.saturating_sub(1).max(1) as usize;
		self.prepare(text_width, document_area.height as usize);

		self.render_search_bar(frame, rows[0]);
		if show_toc {
			self.render_toc(frame, body[0]);
		}
		self.render_document(frame, document_area);
		self.render_status(frame, rows[2]);
	}

	fn render_search_bar(&self, frame: &mut Frame, area: Rect) {
		let requests = self.requests.borrow();
		let theme = &self.theme;

		let mut indicator = Line::default();
		if requests.processing {
			let spinner = Throbber::default()
				.style(theme.empty)
				.throbber_style(theme.empty);
			indicator.spans.push(spinner.to_symbol_span(&self.throbber));
		}
		indicator
			.spans
			.push(Span::styled(format!("{} ", requests.counter), theme.empty));
		indicator.spans.push(toggle("Aa", requests.case_sensitive, theme.toggle_on, theme.empty));
		indicator.spans.push(Span::raw(" "));
		indicator.spans.push(toggle("W", requests.whole_words, theme.toggle_on, theme.empty));
		let indicator_width = indicator.width() as u16;

		let prompt = match self.settings.title.as_deref() {
			Some(title) if !title.is_empty() => format!("{title} > "),
			_ => "> ".to_owned(),
		};
		let prompt_width = prompt.width() as u16;

		let columns = Layout::default()
			.direction(Direction::Horizontal)
			.constraints([
				Constraint::Length(prompt_width),
				Constraint::Min(1),
				Constraint::Length(indicator_width.saturating_add(1)),
			])
			.split(area);

		frame.render_widget(Paragraph::new(prompt).style(theme.prompt), columns[0]);
		let input_style = if self.focus == Focus::Search {
			Style::new()
		} else {
			theme.empty
		};
		frame.render_widget(Paragraph::new(self.input.text()).style(input_style), columns[1]);
		frame.render_widget(Paragraph::new(indicator).right_aligned(), columns[2]);

		if self.focus == Focus::Search {
			let offset = (self.input.cursor_column() as u16).min(columns[1].width.saturating_sub(1));
			frame.set_cursor_position((columns[1].x + offset, columns[1].y));
		}
	}

	fn render_toc(&self, frame: &mut Frame, area: Rect) {
		let theme = &self.theme;
		let width = area.width.saturating_sub(2) as usize;
		let lines: Vec<Line> = self
			.toc
			.iter()
			.map(|entry| {
				let title = truncate(&entry.title, width);
				if self.tracker.is_active(&entry.id) {
					Line::styled(title, theme.active_section)
				} else {
					Line::raw(title)
				}
			})
			.collect();
		let block = Block::default()
			.borders(Borders::RIGHT)
			.border_style(theme.empty)
			.title(Span::styled("Contents", theme.header.add_modifier(Modifier::BOLD)));
		frame.render_widget(Paragraph::new(lines).block(block), area);
	}

	fn render_document(&self, frame: &mut Frame, area: Rect) {
		let theme = &self.theme;
		let height = area.height as usize;
		let lines: Vec<Line> = self
			.layout
			.lines
			.iter()
			.skip(self.scroll)
			.take(height)
			.map(|row| {
				Line::from(
					row.iter()
						.map(|segment| Span::styled(segment.text.as_str(), theme.tone(segment.tone)))
						.collect::<Vec<_>>(),
				)
			})
			.collect();
		let text_area = Rect {
			width: area.width.saturating_sub(1),
			..area
		};
		frame.render_widget(Paragraph::new(lines), text_area);

		let max_scroll = self.layout.height().saturating_sub(height);
		if max_scroll > 0 {
			let mut state = ScrollbarState::new(max_scroll).position(self.scroll);
			let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
				.begin_symbol(None)
				.end_symbol(None)
				.track_symbol(Some("│"))
				.style(theme.empty);
			frame.render_stateful_widget(scrollbar, area, &mut state);
		}
	}

	fn render_status(&self, frame: &mut Frame, area: Rect) {
		let theme = &self.theme;
		let line = match &self.flash {
			Some(flash) => {
				let style = match flash.status.kind {
					FlashKind::Success => theme.success,
					FlashKind::Error => theme.error,
				};
				Line::styled(flash.status.message.as_str(), style)
			}
			None => Line::styled(HINTS, theme.empty),
		};
		frame.render_widget(Paragraph::new(line), area);
	}
}

fn toggle(label: &'static str, on: bool, on_style: Style, off_style: Style) -> Span<'static> {
	Span::styled(label, if on { on_style } else { off_style })
}

fn truncate(text: &str, width: usize) -> String {
	if text.width() <= width {
		return text.to_owned();
	}
	let mut out = String::new();
	let mut used = 0;
	for ch in text.chars() {
		let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
		if used + ch_width + 1 > width {
			break;
		}
		used += ch_width;
		out.push(ch);
	}
	out.push('…');
	out
}
