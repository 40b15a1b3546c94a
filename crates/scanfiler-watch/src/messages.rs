//! HTML status messages sent to tenants
//!
//! Messages use the Telegram HTML subset. Every interpolated value is
//! escaped; file names and classifier output are untrusted.

use scanfiler_core::domain::Classification;
use scanfiler_core::ports::StoredFile;

use crate::errors::StageError;

/// Escapes `&`, `<`, `>` and `"` for HTML text and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Announces that a new file was detected
pub fn new_file(file: &str) -> String {
    format!("<b>New file: <code>{}</code></b>", escape_html(file))
}

/// Reports a failed attempt
///
/// `remaining` is the number of attempts left; `None` means the file is given
/// up without further attempts.
pub fn failure(file: &str, error: &StageError, remaining: Option<u32>) -> String {
    let tail = match remaining {
        Some(1) => "1 try left".to_string(),
        Some(n) => format!("{n} tries left"),
        None => "Not retrying".to_string(),
    };
    format!(
        "{}: <code>{}</code>\n<pre>{}</pre>\n\n{}",
        error.headline(),
        escape_html(file),
        escape_html(&error.detail()),
        tail
    )
}

/// Reports a delivered document
pub fn delivered(file: &str, classification: &Classification, stored: &StoredFile) -> String {
    format!(
        "Classified file: {}\n\n<b>{}</b>\n\n<blockquote><b>Category: {}</b></blockquote>\n\nYou can download it from <a href=\"{}\">{}</a>",
        escape_html(file),
        escape_html(&classification.title),
        escape_html(&classification.category),
        escape_html(&stored.locator),
        escape_html(&stored.provider)
    )
}
