//! Post-processing for raw model output before it reaches the page.
//!
//! The model tends to wrap replies in quotation marks and reach for em-dashes;
//! both read as machine-generated, so we normalize them away. X replies are
//! additionally clamped to the platform's 280-character limit.

use crate::platform::Platform;

/// Normalize a raw completion into the text that gets injected.
///
/// Steps, in order: trim surrounding whitespace; peel matching outer straight
/// quotes (re-trimming after each peel, until no matching pair remains);
/// replace every em-dash with `...`; for X, truncate anything over 280 chars
/// to 277 and append `...`.
pub fn normalize_reply(raw: &str, platform: Platform) -> String {
    let mut text = raw.trim();
    loop {
        let stripped = strip_outer_quotes(text);
        if stripped.len() == text.len() {
            break;
        }
        text = stripped.trim();
    }

    let mut text = text.replace('—', "...");

    if let Some(limit) = platform.char_limit() {
        if text.chars().count() > limit {
            let mut truncated: String = text.chars().take(limit - 3).collect();
            truncated.push_str("...");
            text = truncated;
        }
    }

    text
}

/// Remove one layer of matching outer straight quotes, if present.
fn strip_outer_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
