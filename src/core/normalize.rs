//! Identifier normalization for intent and response names
//!
//! Free text from a spreadsheet ("Cháy là gì?") becomes a slug the dialogue
//! engine accepts as an identifier ("chay_la_gi"):
//! - Unicode NFD decomposition, combining marks dropped
//! - Vietnamese `đ`/`Đ` folded to `d` (it has no decomposition)
//! - Every run of non `[a-z0-9]` characters becomes one underscore
//! - Leading/trailing underscores trimmed, lowercase output

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Prefix the dialogue engine expects on response names
pub const RESPONSE_PREFIX: &str = "utter_";

/// Normalize free text into a `[a-z0-9_]` identifier.
///
/// Returns an empty string when the input holds no letters or digits;
/// callers must treat that as an invalid name.
///
/// # Examples
///
/// ```
/// use botadmin::core::normalize::normalize_name;
///
/// assert_eq!(normalize_name("Cháy là gì?"), "chay_la_gi");
/// assert_eq!(normalize_name("  Đường  dây--nóng "), "duong_day_nong");
/// assert_eq!(normalize_name("?!"), "");
/// ```
pub fn normalize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
        let c = match c {
            'đ' | 'Đ' => 'd',
            other => other,
        };

        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Response name for an intent name (`greet` → `utter_greet`)
pub fn response_name(intent_name: &str) -> String {
    format!("{}{}", RESPONSE_PREFIX, intent_name)
}
