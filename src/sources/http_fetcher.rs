use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::{FetchFailure, FetchResult};
use crate::errors::MoodResult;
use crate::sources::traits::PageFetcher;

/// Plain HTTP GET fetcher that presents itself as a desktop browser
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> MoodResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> MoodResult<Self> {
        Self::new(config.fetch_timeout, &config.user_agent)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchResult {
        let response = self.client.get(url).send().map_err(transport_failure)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "Page returned non-200 status");
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let body = response.text().map_err(transport_failure)?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

fn transport_failure(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        warn!(error = %err, "Request timed out");
        FetchFailure::Timeout
    } else {
        warn!(error = %err, "Request failed");
        FetchFailure::Network(err.to_string())
    }
}
