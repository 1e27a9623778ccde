use regex::Regex;
use std::sync::LazyLock;

use super::normalize::normalize_count;

/// A count as it appears in text: grouped digits, an optional decimal part and
/// an optional magnitude suffix.
const COUNT: &str = r"(?:[0-9]{1,3}(?:[,.\u{00A0}\u{202F} ][0-9]{3})+(?:[.,][0-9]+)?|[0-9]+(?:[.,][0-9]+)?)(?:\s?[KkMmBb]\b)?";

pub static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)monthly\s+listeners").expect("valid keyword pattern"));

pub static COUNT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{COUNT}")).expect("valid count pattern"));

static COUNT_BEFORE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({COUNT})\s*monthly\s+listeners")).expect("valid count pattern")
});

static KEYWORD_BEFORE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)monthly\s+listeners\s*[:\-\u{{2013}}\u{{00B7}}]?\s*({COUNT})"))
        .expect("valid count pattern")
});

/// Finds a count written directly next to the "monthly listeners" phrase.
pub fn count_near_keyword(text: &str) -> Option<u64> {
    [&*COUNT_BEFORE_KEYWORD, &*KEYWORD_BEFORE_COUNT]
        .into_iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|captures| captures.get(1))
        .find_map(|token| normalize_count(token.as_str()))
}

/// First count token in `text` that normalizes.
pub fn first_count(text: &str) -> Option<u64> {
    COUNT_TOKEN
        .find_iter(text)
        .find_map(|token| normalize_count(token.as_str()))
}
