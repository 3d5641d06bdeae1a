pub mod traits;
pub mod prompt;
pub mod ollama;

pub use traits::SentimentClassifier;
pub use ollama::OllamaClassifier;
