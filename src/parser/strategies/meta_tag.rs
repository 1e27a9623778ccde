use log::trace;
use scraper::Selector;
use std::sync::LazyLock;

use crate::parser::base::{Document, ExtractionStrategy};
use crate::parser::normalize::normalize_count;
use crate::parser::patterns::count_near_keyword;

/// Description tags whose prose may mention the listener count.
const DESCRIPTION_KEYS: [&str; 3] = ["og:description", "twitter:description", "description"];
/// Tags that carry the bare number.
const VALUE_KEYS: [&str; 2] = ["music:monthly_listeners", "monthly_listeners"];

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").expect("valid meta selector"));

pub struct MetaTagStrategy;

impl MetaTagStrategy {
    fn content_for<'d>(document: &'d Document<'_>, key: &str) -> Vec<&'d str> {
        document
            .html
            .select(&META)
            .filter(|element| {
                let meta = element.value();
                [meta.attr("property"), meta.attr("name")]
                    .into_iter()
                    .flatten()
                    .any(|value| value.eq_ignore_ascii_case(key))
            })
            .filter_map(|element| element.value().attr("content"))
            .collect()
    }
}

impl ExtractionStrategy for MetaTagStrategy {
    fn name(&self) -> &'static str {
        "meta_tag"
    }

    fn extract(&self, document: &Document<'_>) -> Option<u64> {
        for key in DESCRIPTION_KEYS {
            for content in Self::content_for(document, key) {
                if let Some(value) = count_near_keyword(content) {
                    trace!("meta {} matched: {}", key, content);
                    return Some(value);
                }
            }
        }

        VALUE_KEYS.iter().find_map(|key| {
            Self::content_for(document, key)
                .into_iter()
                .find_map(normalize_count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<u64> {
        MetaTagStrategy.extract(&Document::parse(html))
    }

    #[test]
    fn test_og_description() {
        let html = r#"<html><head><meta property="og:description" content="Artist · 1.2K monthly listeners"></head></html>"#;
        assert_eq!(extract(html), Some(1_200));
    }

    #[test]
    fn test_named_description() {
        let html = r#"<head><meta name="description" content="Listen on the app. 3,401,220 monthly listeners."></head>"#;
        assert_eq!(extract(html), Some(3_401_220));
    }

    #[test]
    fn test_bare_value_tag() {
        let html = r#"<head><meta property="music:monthly_listeners" content="98 765"></head>"#;
        assert_eq!(extract(html), Some(98_765));
    }

    #[test]
    fn test_description_without_phrase() {
        let html = r#"<head><meta property="og:description" content="Artist · 12 songs"></head>"#;
        assert_eq!(extract(html), None);
    }
}
