use serde::{Deserialize, Serialize};

/// How an article portrays its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Unrelated,
    Positive,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Unrelated, Sentiment::Positive, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Unrelated => "unrelated",
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrelated" => Ok(Sentiment::Unrelated),
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub article: String,
    pub subject: String,
}

impl ClassificationRequest {
    pub fn new(article: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            article: article.into(),
            subject: subject.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub sentiment: Sentiment,
    /// Between 0.0 and 1.0
    pub confidence: f64,
    pub reasoning: String,
}

impl ClassificationResult {
    /// Format: "sentiment: {label}, \n\nconfidence: {value},\n\nreasoning: {text}".
    /// Whole confidences keep their decimal point ("1.0").
    pub fn format(&self) -> String {
        format!(
            "sentiment: {}, \n\nconfidence: {:?},\n\nreasoning: {}",
            self.sentiment, self.confidence, self.reasoning
        )
    }
}
