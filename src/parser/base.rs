use scraper::Html;

/// One fetched page, parsed once and shared by every strategy.
pub struct Document<'a> {
    pub raw: &'a str,
    pub html: Html,
}

impl<'a> Document<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            html: Html::parse_document(raw),
        }
    }
}

/// A single way of locating the monthly listener count in a page.
///
/// Strategies never fail: a page without the metric yields `None`.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Document<'_>) -> Option<u64>;
}
