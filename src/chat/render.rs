//! Terminal rendering for the chat client.
//!
//! [`TerminalSurface`] is the [`InputSurface`] of the line-based client.  Messages are
//! printed under a per-group header carrying the role and the `HH:MM` time of the
//! group's first message.  With ANSI styling enabled, a placeholder line is rewritten in
//! place when its reply arrives.

use std::io::{self, Stdout, Write};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::chat::controller::InputSurface;
use crate::chat::timeline::{Message, MessageRef, TimelineStore};
use crate::types::Role;

/// ANSI escape code for dim text (used for placeholders).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for placeholders).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for bold text (used for group headers).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user headers).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for bot headers).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Moves the cursor to the start of the previous line and erases it.
const ANSI_REWRITE_PREVIOUS_LINE: &str = "\x1b[1A\r\x1b[2K";

/// Format a timestamp as zero-padded 24-hour `HH:MM`, in local time when the local
/// offset can be determined and UTC otherwise.
pub fn format_time(timestamp: OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    format_time_in(timestamp, offset)
}

fn format_time_in(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    let local = timestamp.to_offset(offset);
    local
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| format!("{:02}:{:02}", local.hour(), local.minute()))
}

/// Line-oriented terminal surface with optional ANSI styling.
pub struct TerminalSurface<W: Write = Stdout> {
    out: W,
    use_color: bool,
    controls_disabled: bool,
    /// Placeholder printed on the last line, eligible for rewriting.
    placeholder_line: Option<MessageRef>,
}

impl TerminalSurface<Stdout> {
    /// Creates a surface on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a surface on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for TerminalSurface<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Creates a surface writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            controls_disabled: false,
            placeholder_line: None,
        }
    }

    /// Whether input is currently refused.
    pub fn controls_disabled(&self) -> bool {
        self.controls_disabled
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Print an informational message.
    pub fn print_info(&mut self, info: &str) {
        self.placeholder_line = None;
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }

    /// Print an error message.
    pub fn print_error(&mut self, error: &str) {
        self.placeholder_line = None;
        let _ = if self.use_color {
            writeln!(self.out, "{ANSI_RED}Error: {error}{ANSI_RESET}")
        } else {
            writeln!(self.out, "Error: {error}")
        };
        self.flush();
    }

    /// Print every group of `timeline`.
    pub fn render_timeline(&mut self, timeline: &TimelineStore) {
        self.placeholder_line = None;
        for group in timeline.groups() {
            if let Some(first) = group.messages().first() {
                self.print_header(group.role(), first.timestamp());
            }
            for message in group.messages() {
                self.print_body(message);
            }
        }
        self.flush();
    }

    fn print_header(&mut self, role: Role, timestamp: OffsetDateTime) {
        let time = format_time(timestamp);
        let _ = if self.use_color {
            let color = match role {
                Role::User => ANSI_CYAN,
                Role::Bot => ANSI_GREEN,
            };
            writeln!(self.out, "{ANSI_BOLD}{color}{role}{ANSI_RESET} {ANSI_DIM}{time}{ANSI_RESET}")
        } else {
            writeln!(self.out, "{role} {time}")
        };
    }

    fn print_body(&mut self, message: &Message) {
        let _ = if message.is_placeholder() && self.use_color {
            writeln!(self.out, "  {ANSI_DIM}{ANSI_ITALIC}{}{ANSI_RESET}", message.text())
        } else {
            writeln!(self.out, "  {}", message.text().replace('\n', "\n  "))
        };
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

impl<W: Write> InputSurface for TerminalSurface<W> {
    fn set_controls_disabled(&mut self, disabled: bool) {
        self.controls_disabled = disabled;
    }

    // The line editor clears its own buffer on enter.
    fn clear_input(&mut self) {}

    fn focus_input(&mut self) {
        self.flush();
    }

    fn timeline_changed(&mut self, timeline: &TimelineStore, changed: MessageRef) {
        let Some(message) = timeline.get(changed) else {
            return;
        };
        // The line editor already echoed what the user typed.
        if message.role() == Role::User {
            return;
        }
        let rewriting = self.placeholder_line == Some(changed);
        if rewriting && self.use_color {
            let _ = write!(self.out, "{ANSI_REWRITE_PREVIOUS_LINE}");
        } else if !rewriting && changed.index() == 0 {
            self.print_header(message.role(), message.timestamp());
        }
        self.print_body(message);
        self.placeholder_line = message.is_placeholder().then_some(changed);
        self.flush();
    }
}
