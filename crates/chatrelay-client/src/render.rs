//! Turns decoded server frames into the lines printed to the terminal.

use chrono::{Local, TimeZone};

/// `"(HH:MM) NAME: TEXT"`, with `timestamp` (Unix seconds) interpreted in
/// local time.
pub fn chat_line(timestamp: u32, name: &str, text: &str) -> String {
    let when = Local
        .timestamp_opt(i64::from(timestamp), 0)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "??:??".to_string());
    format!("({when}) {name}: {text}")
}

/// `"** TEXT **"`.
pub fn reply_line(text: &str) -> String {
    format!("** {text} **")
}
