use log::{debug, trace};

use super::base::{Document, ExtractionStrategy};
use super::strategies::{
    DomStrategy, MetaTagStrategy, ProximityStrategy, StructuredDataStrategy, TextPatternStrategy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Found { value: u64, strategy: &'static str },
    NotFound,
}

impl ExtractionOutcome {
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Found { value, .. } => Some(*value),
            Self::NotFound => None,
        }
    }
}

/// One scrape-and-extract try for an artist page.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub document: String,
    pub attempt: u32,
    pub outcome: ExtractionOutcome,
}

/// Ordered chain of strategies; the first one that yields a count wins.
pub struct MetricExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor {
    pub fn new() -> Self {
        Self::from_strategies(vec![
            Box::new(MetaTagStrategy),
            Box::new(StructuredDataStrategy),
            Box::new(TextPatternStrategy),
            Box::new(DomStrategy),
            Box::new(ProximityStrategy),
        ])
    }

    pub fn from_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(&self, html: &str, artist_name: &str) -> ExtractionOutcome {
        trace!("Extracting from {} bytes for {}", html.len(), artist_name);
        let document = Document::parse(html);

        for strategy in &self.strategies {
            if let Some(value) = strategy.extract(&document) {
                debug!(
                    "Strategy {} found {} monthly listeners for {}",
                    strategy.name(),
                    value,
                    artist_name
                );
                return ExtractionOutcome::Found {
                    value,
                    strategy: strategy.name(),
                };
            }
            trace!("Strategy {} found nothing for {}", strategy.name(), artist_name);
        }

        ExtractionOutcome::NotFound
    }

    /// Runs the chain and keeps the document alongside the outcome.
    pub fn attempt(&self, html: String, attempt: u32, artist_name: &str) -> ExtractionAttempt {
        let outcome = self.extract(&html, artist_name);
        ExtractionAttempt {
            document: html,
            attempt,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_tag_example() {
        let html = r#"<html><head><meta property="og:description" content="Artist · 1.2K monthly listeners"></head><body></body></html>"#;
        let outcome = MetricExtractor::new().extract(html, "Artist");
        assert_eq!(
            outcome,
            ExtractionOutcome::Found {
                value: 1_200,
                strategy: "meta_tag"
            }
        );
    }

    #[test]
    fn test_meta_wins_over_proximity() {
        let html = r#"<html><head>
            <meta property="og:description" content="Artist · 500 monthly listeners">
        </head><body>
            <h2>Monthly listeners</h2><div><span>rank</span><span>9,999</span></div>
        </body></html>"#;
        let outcome = MetricExtractor::new().extract(html, "Artist");
        assert_eq!(outcome.value(), Some(500));
    }

    #[test]
    fn test_proximity_used_as_last_resort() {
        let html = r#"<body><h2>Monthly listeners</h2><div><span>rank</span><span>9,999</span></div></body>"#;
        let outcome = MetricExtractor::new().extract(html, "Artist");
        assert_eq!(
            outcome,
            ExtractionOutcome::Found {
                value: 9_999,
                strategy: "proximity"
            }
        );
    }

    #[test]
    fn test_structured_data_before_text() {
        let html = r#"<body>
            <script>window.__STATE__ = {"monthlyListeners": 321};</script>
            <p>4,000 monthly listeners</p>
        </body>"#;
        let outcome = MetricExtractor::new().extract(html, "Artist");
        assert_eq!(
            outcome,
            ExtractionOutcome::Found {
                value: 321,
                strategy: "structured_data"
            }
        );
    }

    #[test]
    fn test_not_found() {
        let html = "<html><body><h1>Artist</h1><p>Popular releases</p></body></html>";
        assert_eq!(
            MetricExtractor::new().extract(html, "Artist"),
            ExtractionOutcome::NotFound
        );
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let html = r#"<div><span>2.5M</span> <span>monthly listeners</span></div>"#;
        let extractor = MetricExtractor::new();
        let first = extractor.extract(html, "Artist");
        let second = extractor.extract(html, "Artist");
        assert_eq!(first, second);
        assert_eq!(first.value(), Some(2_500_000));
    }

    #[test]
    fn test_attempt_keeps_document() {
        let attempt = MetricExtractor::new().attempt("<p>0 monthly listeners</p>".to_string(), 2, "Artist");
        assert_eq!(attempt.attempt, 2);
        assert_eq!(attempt.outcome.value(), Some(0));
        assert!(attempt.document.contains("monthly"));
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            MetricExtractor::new().strategy_names(),
            vec!["meta_tag", "structured_data", "text_pattern", "dom", "proximity"]
        );
    }
}
