use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a page could not be retrieved
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchFailure {
    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    HttpStatus(u16),

    #[error("{0}")]
    Network(String),
}

impl FetchFailure {
    /// Text standing in for the article body when a fetch fails
    pub fn as_article_text(&self) -> String {
        format!("Error: {}", self)
    }
}

/// Outcome of one fetch: the page body (raw HTML from the fetcher,
/// paragraph text once it went through the cache) or the failure
pub type FetchResult = Result<String, FetchFailure>;
