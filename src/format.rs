use crate::preview::{is_image, is_textual};
use chrono::{TimeZone, Utc};

/// `1536` -> `"1.50 KB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Unix seconds to a calendar date (UTC).
pub fn format_date(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

pub fn sanitize_label(s: &str) -> String {
    // Control characters (ESC in particular) would corrupt the terminal.
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_control() {
            out.push('\u{FFFD}');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Like [`sanitize_label`] but keeps line breaks and tabs, for text previews.
/// Carriage returns are dropped so CRLF text reads like LF text.
pub fn sanitize_text(s: &str) -> String {
    s.chars()
        .filter_map(|ch| match ch {
            '\r' => None,
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => Some('\u{FFFD}'),
            c => Some(c),
        })
        .collect()
}

/// History entries containing `input`, case-insensitively, in history order.
pub fn suggestions<'a>(history: &'a [String], input: &str) -> Vec<&'a str> {
    let needle = input.trim().to_lowercase();
    history
        .iter()
        .filter(|addr| addr.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

/// Glyph shown when a preview has no payload.
pub fn kind_glyph(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if is_image(ct) => "[img]",
        Some(ct) if ct.starts_with("text/") => "[txt]",
        Some(ct) if is_textual(ct) => "[</>]",
        _ => "[doc]",
    }
}
