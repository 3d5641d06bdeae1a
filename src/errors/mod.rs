use thiserror::Error;

use crate::domain::FetchFailure;

#[derive(Error, Debug)]
pub enum MoodError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Request errors
    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Article retrieval errors, rendered the way the fetch layer reports them
    #[error("{0}")]
    Fetch(#[from] FetchFailure),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Classification errors
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Malformed classifier output: {0}")]
    MalformedOutput(String),

    #[error("Language model error: {0}")]
    Model(String),

    // Evaluation errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ollama_chat::ChatError> for MoodError {
    fn from(err: ollama_chat::ChatError) -> Self {
        MoodError::Model(err.to_string())
    }
}

impl MoodError {
    /// Text shown to a person at the request boundary
    pub fn user_message(&self) -> String {
        match self {
            MoodError::InvalidUrl => self.to_string(),
            other => format!("Error: {}", other),
        }
    }
}

pub type MoodResult<T> = Result<T, MoodError>;
