//! # Prompt escaping for script embedding.
//!
//! The script builder embeds the prompt between double quotes inside the
//! generated script and performs no escaping of its own; this module is the
//! caller-side escape step. Escaped characters: backslash, both quote
//! kinds, newlines and carriage returns, and the Unicode line and paragraph
//! separators (which terminate script string literals like a raw newline
//! would).

/// Escape `text` for embedding in a double-quoted script string literal.
pub fn escape_for_script(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}
