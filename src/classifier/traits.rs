use crate::domain::{ClassificationRequest, ClassificationResult};
use crate::errors::MoodResult;

/// Decides how an article portrays its subject. Implementations are
/// typically remote, slow and rate limited; callers invoke them once per
/// request and never cache the answer.
#[cfg_attr(test, mockall::automock)]
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, request: &ClassificationRequest) -> MoodResult<ClassificationResult>;
}
