use regex::Regex;
use std::sync::LazyLock;

use crate::parser::base::{Document, ExtractionStrategy};
use crate::parser::normalize::normalize_count;
use crate::parser::patterns::count_near_keyword;

static DATA_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-monthly-listeners\s*=\s*["']?([0-9][0-9,. ]*[0-9]|[0-9])"#)
        .expect("valid attribute pattern")
});

/// Regex pass over the raw markup, so counts hidden in attributes or
/// non-rendered fragments are still found.
pub struct TextPatternStrategy;

impl ExtractionStrategy for TextPatternStrategy {
    fn name(&self) -> &'static str {
        "text_pattern"
    }

    fn extract(&self, document: &Document<'_>) -> Option<u64> {
        count_near_keyword(document.raw).or_else(|| {
            DATA_ATTRIBUTE
                .captures_iter(document.raw)
                .filter_map(|captures| captures.get(1))
                .find_map(|token| normalize_count(token.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<u64> {
        TextPatternStrategy.extract(&Document::parse(html))
    }

    #[test]
    fn test_adjacent_phrase() {
        assert_eq!(extract("<div>27.431.902 monthly listeners</div>"), Some(27_431_902));
    }

    #[test]
    fn test_data_attribute() {
        let html = r#"<section data-monthly-listeners="1,500,000"></section>"#;
        assert_eq!(extract(html), Some(1_500_000));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract("<div>320 followers</div>"), None);
    }
}
