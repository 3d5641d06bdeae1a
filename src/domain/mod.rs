pub mod article;
pub mod classification;
pub mod example;

pub use article::{FetchFailure, FetchResult};
pub use classification::{ClassificationRequest, ClassificationResult, Sentiment};
pub use example::LabeledExample;
