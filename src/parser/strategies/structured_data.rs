use log::trace;
use scraper::Selector;
use serde_json::{Deserializer, Map, Value};
use std::sync::LazyLock;

use crate::parser::base::{Document, ExtractionStrategy};

const LISTENER_KEYS: [&str; 3] = ["monthlyListeners", "monthly_listeners", "monthlyListenerCount"];
const MAX_DEPTH: usize = 10;
/// Upper bound on embedded JSON objects parsed per script.
const MAX_CANDIDATES: usize = 64;

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

/// Searches JSON embedded in inline scripts, either as the whole payload
/// (`application/ld+json`, `application/json`) or assigned to a variable.
pub struct StructuredDataStrategy;

impl StructuredDataStrategy {
    fn payloads(script: &str) -> impl Iterator<Item = Value> + '_ {
        let whole = serde_json::from_str::<Value>(script.trim()).ok();

        let mut offsets = script.match_indices('{').map(|(offset, _)| offset);
        let mut consumed = 0;
        let mut parsed = 0;
        let embedded = std::iter::from_fn(move || {
            while parsed < MAX_CANDIDATES {
                let offset = offsets.next()?;
                // skip objects nested inside one already parsed
                if offset < consumed {
                    continue;
                }
                let mut stream = Deserializer::from_str(&script[offset..]).into_iter::<Value>();
                if let Some(Ok(value @ Value::Object(_))) = stream.next() {
                    consumed = offset + stream.byte_offset();
                    parsed += 1;
                    return Some(value);
                }
            }
            None
        });

        whole.into_iter().chain(embedded)
    }

    fn search(value: &Value, depth: usize) -> Option<u64> {
        if depth > MAX_DEPTH {
            return None;
        }
        match value {
            Value::Object(map) => Self::search_object(map, depth),
            Value::Array(items) => items.iter().find_map(|item| Self::search(item, depth + 1)),
            _ => None,
        }
    }

    fn search_object(map: &Map<String, Value>, depth: usize) -> Option<u64> {
        for key in LISTENER_KEYS {
            if let Some(value) = map.get(key).and_then(Value::as_u64) {
                trace!("structured data key {} = {}", key, value);
                return Some(value);
            }
        }

        if let Some(value) = Self::listen_statistic(map) {
            return Some(value);
        }

        map.values().find_map(|child| Self::search(child, depth + 1))
    }

    /// JSON-LD `InteractionCounter` whose type is a listen action.
    fn listen_statistic(map: &Map<String, Value>) -> Option<u64> {
        let interaction = map.get("interactionType")?;
        let kind = match interaction {
            Value::String(kind) => kind.as_str(),
            Value::Object(inner) => inner.get("@type").and_then(Value::as_str)?,
            _ => return None,
        };
        if !kind.to_ascii_lowercase().contains("listen") {
            return None;
        }
        map.get("userInteractionCount").and_then(Value::as_u64)
    }
}

impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn extract(&self, document: &Document<'_>) -> Option<u64> {
        document
            .html
            .select(&SCRIPT)
            .filter(|script| script.value().attr("src").is_none())
            .find_map(|script| {
                let text: String = script.text().collect();
                let found = Self::payloads(&text).find_map(|payload| Self::search(&payload, 0));
                found
            })
    }
}
