//! User-facing messages
//!
//! Messages go to stderr so stdout only carries reports.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

use colored::{Color, Colorize};

/// Presents progress to the user.
pub trait UxMessenger: Send + Sync {
    fn show_info(&self, msg: &str);
    fn show_success(&self, msg: &str);
    fn show_warning(&self, msg: &str);
    fn show_error(&self, msg: &str);
    fn show_title(&self, title: &str, description: &str);
}

/// Prefixed lines on stderr, colored when stderr is a terminal.
#[derive(Debug, Clone)]
pub struct ConsoleMessenger {
    pub use_color: bool,
}

impl Default for ConsoleMessenger {
    fn default() -> Self {
        Self::new(std::io::stderr().is_terminal())
    }
}

impl ConsoleMessenger {
    /// Colors are forced on or off process-wide, since stdout may be piped
    /// while stderr is a terminal.
    pub fn new(use_color: bool) -> Self {
        colored::control::set_override(use_color);
        Self { use_color }
    }

    fn render(&self, label: &str, color: Color, msg: &str) -> String {
        let label = format!("{:>8}", label);
        if self.use_color {
            format!("{} {}", label.as_str().color(color).bold(), msg)
        } else {
            format!("{} {}", label, msg)
        }
    }

    fn render_title(&self, title: &str, description: &str) -> String {
        let title = title.trim().to_uppercase();
        let rule = "-".repeat(title.len().max(description.len()));
        if self.use_color {
            format!("{}\n{}\n{}", title.as_str().bold(), description, rule.as_str().dimmed())
        } else {
            format!("{}\n{}\n{}", title, description, rule)
        }
    }

    fn print(&self, line: String) {
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }
}

impl UxMessenger for ConsoleMessenger {
    fn show_info(&self, msg: &str) {
        self.print(self.render("INFO", Color::Cyan, msg));
    }

    fn show_success(&self, msg: &str) {
        self.print(self.render("SUCCESS", Color::Green, msg));
    }

    fn show_warning(&self, msg: &str) {
        self.print(self.render("WARNING", Color::Yellow, msg));
    }

    fn show_error(&self, msg: &str) {
        self.print(self.render("ERROR", Color::Red, msg));
    }

    fn show_title(&self, title: &str, description: &str) {
        self.print(self.render_title(title, description));
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentMessenger;

impl UxMessenger for SilentMessenger {
    fn show_info(&self, _: &str) {}
    fn show_success(&self, _: &str) {}
    fn show_warning(&self, _: &str) {}
    fn show_error(&self, _: &str) {}
    fn show_title(&self, _: &str, _: &str) {}
}

/// Keeps every message in memory as `(level, message)`.
#[derive(Debug, Clone, Default)]
pub struct CapturingMessenger {
    messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl CapturingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level.to_string(), msg.to_string()));
        }
    }
}

impl UxMessenger for CapturingMessenger {
    fn show_info(&self, msg: &str) {
        self.push("info", msg);
    }

    fn show_success(&self, msg: &str) {
        self.push("success", msg);
    }

    fn show_warning(&self, msg: &str) {
        self.push("warning", msg);
    }

    fn show_error(&self, msg: &str) {
        self.push("error", msg);
    }

    fn show_title(&self, title: &str, description: &str) {
        self.push("title", &format!("{}: {}", title, description));
    }
}
