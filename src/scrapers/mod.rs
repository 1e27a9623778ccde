mod errors;
pub mod http_scraper;
pub mod mock_scraper;

mod scraper;
pub use errors::{FetchError, FetchResult};
pub use http_scraper::HttpScraper;
pub use mock_scraper::{MockFailure, MockResponse, MockScraper};
pub use scraper::Scraper;
