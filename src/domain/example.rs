use serde::{Deserialize, Serialize};

use super::Sentiment;

/// One hand-labelled case for measuring classifier accuracy.
/// Carries either the article text itself or a URL to fetch it from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub subject: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LabeledExample {
    pub fn from_article(article: &str, subject: &str, sentiment: Sentiment) -> Self {
        Self {
            subject: subject.to_string(),
            sentiment,
            article: Some(article.to_string()),
            url: None,
        }
    }

    pub fn from_url(url: &str, subject: &str, sentiment: Sentiment) -> Self {
        Self {
            subject: subject.to_string(),
            sentiment,
            article: None,
            url: Some(url.to_string()),
        }
    }

    /// Short label for report tables
    pub fn describe(&self) -> String {
        match (&self.url, &self.article) {
            (Some(url), _) => url.clone(),
            (None, Some(article)) => {
                let preview: String = article.chars().take(40).collect();
                if preview.len() < article.len() {
                    format!("{}...", preview)
                } else {
                    preview
                }
            }
            (None, None) => "<empty>".to_string(),
        }
    }
}
