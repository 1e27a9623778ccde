use log::trace;
use scraper::{ElementRef, Node};

use crate::parser::base::{Document, ExtractionStrategy};
use crate::parser::patterns::{count_near_keyword, KEYWORD};

const MAX_ANCESTORS: usize = 3;
const MAX_JOINED_CHARS: usize = 600;

/// Walks text nodes mentioning the keyword, widening to enclosing elements
/// when the number lives in a sibling.
pub struct DomStrategy;

pub(crate) fn is_hidden(element: &ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template"
    )
}

fn joined_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ExtractionStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn extract(&self, document: &Document<'_>) -> Option<u64> {
        for node in document.html.root_element().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            if !KEYWORD.is_match(text) {
                continue;
            }
            let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            if is_hidden(&parent) {
                continue;
            }

            if let Some(value) = count_near_keyword(text) {
                return Some(value);
            }

            let enclosing = std::iter::once(parent)
                .chain(parent.ancestors().filter_map(ElementRef::wrap))
                .take(MAX_ANCESTORS);
            for ancestor in enclosing {
                let joined = joined_text(&ancestor);
                if joined.chars().count() > MAX_JOINED_CHARS {
                    break;
                }
                if let Some(value) = count_near_keyword(&joined) {
                    trace!("dom match in <{}>: {}", ancestor.value().name(), joined);
                    return Some(value);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<u64> {
        DomStrategy.extract(&Document::parse(html))
    }

    #[test]
    fn test_sibling_elements() {
        let html = r#"<div class="stats"><span>1,234,567</span><span>monthly listeners</span></div>"#;
        assert_eq!(extract(html), Some(1_234_567));
    }

    #[test]
    fn test_heading_then_value() {
        let html = r#"<section><div><h3>Monthly listeners</h3></div><p>842K</p></section>"#;
        assert_eq!(extract(html), Some(842_000));
    }

    #[test]
    fn test_script_text_ignored() {
        let html = r#"<body><script>var s = "5 monthly listeners";</script></body>"#;
        assert_eq!(extract(html), None);
    }
}
