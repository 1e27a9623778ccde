use log::trace;
use scraper::{ElementRef, Node};

use super::dom::is_hidden;
use crate::parser::base::{Document, ExtractionStrategy};
use crate::parser::patterns::{first_count, KEYWORD};

const WINDOW_CHARS: usize = 200;

/// Last resort: the first count within a fixed window around any mention of
/// the keyword in the visible text.
pub struct ProximityStrategy;

fn visible_text(document: &Document<'_>) -> String {
    let mut parts = Vec::new();
    for node in document.html.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| is_hidden(&parent));
        let text = text.trim();
        if !hidden && !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

fn window(text: &str, start: usize, end: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(WINDOW_CHARS - 1)
        .map_or(0, |(index, _)| index);
    let to = text[end..]
        .char_indices()
        .nth(WINDOW_CHARS)
        .map_or(text.len(), |(index, _)| end + index);
    &text[from..to]
}

impl ExtractionStrategy for ProximityStrategy {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn extract(&self, document: &Document<'_>) -> Option<u64> {
        let text = visible_text(document);
        KEYWORD.find_iter(&text).find_map(|mention| {
            let around = window(&text, mention.start(), mention.end());
            trace!("proximity window: {}", around);
            first_count(around)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<u64> {
        ProximityStrategy.extract(&Document::parse(html))
    }

    #[test]
    fn test_number_within_window() {
        let html = "<main><h2>Monthly listeners</h2><ul><li>Rank</li><li>~ 9,999</li></ul></main>";
        assert_eq!(extract(html), Some(9_999));
    }

    #[test]
    fn test_number_outside_window() {
        let filler = "word ".repeat(60);
        let html = format!("<p>Monthly listeners</p><p>{filler}</p><p>77</p>");
        assert_eq!(extract(&html), None);
    }

    #[test]
    fn test_multibyte_window_boundaries() {
        let filler = "é".repeat(250);
        let html = format!("<p>{filler} monthly listeners ≈ 310</p>");
        assert_eq!(extract(&html), Some(310));
    }
}
