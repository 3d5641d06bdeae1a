pub mod traits;
pub mod extractor;
pub mod http_fetcher;

pub use traits::PageFetcher;
pub use extractor::extract_paragraphs;
pub use http_fetcher::HttpFetcher;
