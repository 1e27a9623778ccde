mod dom;
mod meta_tag;
mod proximity;
mod structured_data;
mod text_pattern;

pub use dom::DomStrategy;
pub use meta_tag::MetaTagStrategy;
pub use proximity::ProximityStrategy;
pub use structured_data::StructuredDataStrategy;
pub use text_pattern::TextPatternStrategy;
