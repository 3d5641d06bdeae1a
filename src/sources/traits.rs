use crate::domain::FetchResult;

#[cfg_attr(test, mockall::automock)]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the raw body of a page with a single request.
    /// Callers are expected to have validated the URL.
    fn fetch(&self, url: &str) -> FetchResult;
}
