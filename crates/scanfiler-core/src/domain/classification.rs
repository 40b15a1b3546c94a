//! Classification result produced for one document

use serde::{Deserialize, Serialize};

/// Structured classification of a scanned document
///
/// Deserialized from the classifier's JSON answer. All four keys are
/// required; a response missing any of them does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Human-readable document title
    pub title: String,
    /// Category bucket, used verbatim as a destination folder
    pub category: String,
    /// Why the classifier chose this category
    pub explanation: String,
    /// Suggested file name for the stored document
    #[serde(rename = "filename")]
    pub file_name: String,
}

/// Returns the first `max_chars` characters of `text`
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
