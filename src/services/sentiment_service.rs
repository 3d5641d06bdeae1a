use std::panic::{self, AssertUnwindSafe};

use tracing::{info, instrument, warn};
use url::Url;

use crate::classifier::{OllamaClassifier, SentimentClassifier};
use crate::config::Config;
use crate::domain::{ClassificationRequest, ClassificationResult};
use crate::errors::{MoodError, MoodResult};
use crate::sources::{HttpFetcher, PageFetcher};
use crate::storage::{CacheStats, FetchCache};

/// Pipeline wired to the real network fetcher and model backend
pub type DefaultSentimentService = SentimentService<HttpFetcher, OllamaClassifier>;

pub struct SentimentService<F: PageFetcher, C: SentimentClassifier> {
    cache: FetchCache<F>,
    classifier: C,
    classify_fetch_errors: bool,
}

impl DefaultSentimentService {
    pub fn from_config(config: &Config) -> MoodResult<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        let classifier = OllamaClassifier::new(config)?;
        Ok(Self::new(fetcher, classifier, config))
    }
}

impl<F: PageFetcher, C: SentimentClassifier> SentimentService<F, C> {
    pub fn new(fetcher: F, classifier: C, config: &Config) -> Self {
        Self {
            cache: FetchCache::new(fetcher, config.cache_capacity, config.cache_failures),
            classifier,
            classify_fetch_errors: config.classify_fetch_errors,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Classify the article at `url` with respect to `subject` and render
    /// the outcome as text. Every failure, including a panicking
    /// collaborator, comes back as text rather than an error.
    #[instrument(level = "info", skip(self))]
    pub fn get_sentiment(&self, url: &str, subject: &str) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.analyze(url, subject))) {
            Ok(Ok(result)) => result.format(),
            Ok(Err(e)) => {
                if !matches!(e, MoodError::InvalidUrl) {
                    warn!(error = %e, "Sentiment request failed");
                }
                e.user_message()
            }
            Err(_) => {
                warn!("Sentiment pipeline panicked");
                MoodError::Classification("internal failure while handling the request".to_string())
                    .user_message()
            }
        }
    }

    /// Structured form of [`get_sentiment`](Self::get_sentiment)
    pub fn analyze(&self, url: &str, subject: &str) -> MoodResult<ClassificationResult> {
        validate_url(url)?;

        let article = match self.cache.get_or_fetch(url) {
            Ok(article) => article,
            Err(failure) if self.classify_fetch_errors => {
                warn!(%url, %failure, "Fetch failed; classifying the error text");
                failure.as_article_text()
            }
            Err(failure) => return Err(failure.into()),
        };

        self.classify_article(&article, subject)
    }

    /// Validated, cached fetch + extraction without classification
    pub fn fetch_article(&self, url: &str) -> MoodResult<String> {
        validate_url(url)?;
        Ok(self.cache.get_or_fetch(url)?)
    }

    /// Run the classifier on article text that is already at hand
    pub fn classify_article(&self, article: &str, subject: &str) -> MoodResult<ClassificationResult> {
        let request = ClassificationRequest::new(article, subject);
        let result = self.classifier.classify(&request)?;

        info!(
            sentiment = %result.sentiment,
            confidence = result.confidence,
            article_bytes = article.len(),
            "Classified article"
        );
        Ok(result)
    }
}

/// Only absolute https URLs are accepted
pub fn validate_url(url: &str) -> MoodResult<Url> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "https" => Ok(parsed),
        _ => Err(MoodError::InvalidUrl),
    }
}
