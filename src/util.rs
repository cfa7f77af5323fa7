//! Small helpers shared by the notification and dialog paths.

use std::io;
use std::process::{Command, Output, Stdio};

/// Quote `text` as an AppleScript string literal.
///
/// Backslashes and double quotes are escaped; line breaks are kept as the
/// `\n` escape so a message cannot end the statement early.
pub fn applescript_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// AppleScript list literal of quoted strings, e.g. `{"A", "B"}`.
pub fn applescript_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| applescript_string(item)).collect();
    format!("{{{}}}", quoted.join(", "))
}

/// Run a script through `osascript`, capturing its output.
pub fn run_osascript(script: &str) -> io::Result<Output> {
    log::trace!("osascript: {}", script);
    Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}
