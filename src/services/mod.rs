pub mod sentiment_service;
pub mod evaluation_service;

pub use sentiment_service::{validate_url, DefaultSentimentService, SentimentService};
pub use evaluation_service::{load_dataset, EvaluationReport, EvaluationService, Outcome};
