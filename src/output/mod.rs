//! Output formatting and user messages

pub mod formatter;
pub mod human;
pub mod json;
pub mod ux;

pub use formatter::{format_report, OutputFormat};
pub use ux::{CapturingMessenger, ConsoleMessenger, SilentMessenger, UxMessenger};
