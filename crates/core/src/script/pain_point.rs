//! Pain-point extraction from free-text audience descriptions.

use regex::Regex;
use std::sync::LazyLock;

/// Used whenever no pain point can be read from the audience text.
pub const DEFAULT_PAIN_POINT: &str = "this problem";

// "experiencing <phrase>" up to the next comma, period or open-parenthesis.
static RE_EXPERIENCING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)experiencing ([^,.(]+)").expect("valid experiencing regex")
});

static RE_INTEREST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)concerned about|interested in|experiencing").expect("valid marker regex")
});

/// Find the pain point named in an audience description, if any.
///
/// Tries `"experiencing <phrase>"` first, then the text following the first
/// `concerned about`, `interested in` or `experiencing` marker up to the next
/// comma. The result is trimmed and lowercased; an empty capture counts as
/// no match.
pub fn find_pain_point(target_audience: &str) -> Option<String> {
    if let Some(captures) = RE_EXPERIENCING.captures(target_audience) {
        if let Some(phrase) = captures.get(1).and_then(|m| normalize(m.as_str())) {
            return Some(phrase);
        }
    }

    let marker = RE_INTEREST_MARKER.find(target_audience)?;
    let rest = &target_audience[marker.end()..];
    let phrase = rest.split(',').next().unwrap_or_default();
    normalize(phrase)
}

/// Like [`find_pain_point`], falling back to [`DEFAULT_PAIN_POINT`].
pub fn extract_pain_point(target_audience: &str) -> String {
    find_pain_point(target_audience).unwrap_or_else(|| DEFAULT_PAIN_POINT.to_string())
}

fn normalize(phrase: &str) -> Option<String> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        None
    } else {
        Some(phrase.to_lowercase())
    }
}
