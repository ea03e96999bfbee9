//! System clipboard mechanisms used by the viewer.
//!
//! OSC 52 goes through the terminal (and survives tmux and ssh); the native
//! chain shells out to whichever clipboard tool is installed.

use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use base64::Engine;
use docfind_core::export::{Clipboard, ClipboardError};

/// Clipboard escape sequence written to the terminal.
#[derive(Debug, Default)]
pub struct Osc52;

impl Osc52 {
	/// Escape sequence for `text`, wrapped for tmux passthrough when needed.
	pub fn sequence(text: &str, in_tmux: bool) -> String {
		let encoded = base64::engine::general_purpose::STANDARD.encode(text);
		if in_tmux {
			format!("\x1bPtmux;\x1b\x1b]52;c;{encoded}\x07\x1b\\")
		} else {
			format!("\x1b]52;c;{encoded}\x07")
		}
	}
}

impl Clipboard for Osc52 {
	fn name(&self) -> &str {
		"osc52"
	}

	fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
		let sequence = Self::sequence(text, env::var_os("TMUX").is_some());
		let mut stdout = std::io::stdout().lock();
		stdout.write_all(sequence.as_bytes())?;
		stdout.flush()?;
		Ok(())
	}
}

/// Native clipboard tools tried in order.
#[derive(Debug)]
pub struct NativeTools {
	candidates: Vec<(&'static str, &'static [&'static str])>,
}

impl Default for NativeTools {
	fn default() -> Self {
		let mut candidates: Vec<(&'static str, &'static [&'static str])> = Vec::new();
		if env::var_os("WAYLAND_DISPLAY").is_some() {
			candidates.push(("wl-copy", &[]));
		}
		candidates.push(("xclip", &["-selection", "clipboard"]));
		candidates.push(("xsel", &["--clipboard", "--input"]));
		candidates.push(("pbcopy", &[]));
		Self { candidates }
	}
}

impl NativeTools {
	fn pipe(command: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
		let mut child = Command::new(command)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()?;
		if let Some(mut stdin) = child.stdin.take() {
			stdin.write_all(text.as_bytes())?;
		}
		let status = child.wait()?;
		if status.success() {
			Ok(())
		} else {
			Err(ClipboardError::Command {
				command: command.to_owned(),
				reason: status.to_string(),
			})
		}
	}
}

impl Clipboard for NativeTools {
	fn name(&self) -> &str {
		"native"
	}

	fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
		for (command, args) in &self.candidates {
			match Self::pipe(command, args, text) {
				Ok(()) => return Ok(()),
				Err(error) => tracing::trace!(command, %error, "clipboard tool failed"),
			}
		}
		Err(ClipboardError::Unavailable)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn osc52_encodes_payload() {
		assert_eq!(Osc52::sequence("hi", false), "\x1b]52;c;aGk=\x07");
	}

	#[test]
	fn osc52_wraps_for_tmux() {
		let sequence = Osc52::sequence("hi", true);
		assert!(sequence.starts_with("\x1bPtmux;"));
		assert!(sequence.ends_with("\x1b\\"));
	}

	#[test]
	fn empty_tool_chain_is_unavailable() {
		let mut tools = NativeTools {
			candidates: Vec::new(),
		};
		assert!(matches!(tools.write_text("x"), Err(ClipboardError::Unavailable)));
	}
}
