use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::info;

use crate::classifier::SentimentClassifier;
use crate::domain::{LabeledExample, Sentiment};
use crate::errors::{MoodError, MoodResult};
use crate::services::SentimentService;
use crate::sources::PageFetcher;

pub const DEFAULT_THREADS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Match,
    Mismatch { predicted: Sentiment },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExampleOutcome {
    pub example: LabeledExample,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub outcomes: Vec<ExampleOutcome>,
}

impl EvaluationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn correct(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Match))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Failed examples count against accuracy
    pub fn accuracy(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.total() as f64
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    /// One row per example followed by a summary line
    pub fn format(&self) -> String {
        let mut out = String::new();

        for (i, row) in self.outcomes.iter().enumerate() {
            let verdict = match &row.outcome {
                Outcome::Match => "ok".to_string(),
                Outcome::Mismatch { predicted } => format!("predicted {}", predicted),
                Outcome::Failed(reason) => format!("failed: {}", reason),
            };
            out.push_str(&format!(
                "  {:>3}. [{}] {} expected {} -> {}\n",
                i + 1,
                row.example.subject,
                row.example.describe(),
                row.example.sentiment,
                verdict
            ));
        }

        out.push_str(&format!(
            "\nAccuracy: {}/{} ({:.1}%), {} failed",
            self.correct(),
            self.total(),
            self.accuracy() * 100.0,
            self.failed()
        ));
        out
    }
}

/// Read a JSON array of labelled examples
pub fn load_dataset<P: AsRef<Path>>(path: P) -> MoodResult<Vec<LabeledExample>> {
    let content = std::fs::read_to_string(path)?;
    let examples: Vec<LabeledExample> = serde_json::from_str(&content)?;

    if examples.is_empty() {
        return Err(MoodError::Dataset("dataset is empty".to_string()));
    }

    if let Some(i) = examples
        .iter()
        .position(|e| e.article.is_none() && e.url.is_none())
    {
        return Err(MoodError::Dataset(format!(
            "example {} has neither an article nor a url",
            i + 1
        )));
    }

    Ok(examples)
}

pub struct EvaluationService<'a, F: PageFetcher, C: SentimentClassifier> {
    service: &'a SentimentService<F, C>,
    threads: usize,
}

impl<'a, F: PageFetcher, C: SentimentClassifier> EvaluationService<'a, F, C> {
    pub fn new(service: &'a SentimentService<F, C>, threads: usize) -> Self {
        Self {
            service,
            threads: threads.max(1),
        }
    }

    /// Score every example, spreading the work over the worker threads.
    /// Outcomes keep the dataset order.
    pub fn evaluate(&self, examples: &[LabeledExample]) -> EvaluationReport {
        let chunk_size = examples.len().div_ceil(self.threads).max(1);

        let outcomes = std::thread::scope(|s| {
            let workers: Vec<_> = examples
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = s.spawn(move || {
                        chunk
                            .iter()
                            .map(|example| self.score(example))
                            .collect::<Vec<_>>()
                    });
                    (chunk.len(), handle)
                })
                .collect();

            workers
                .into_iter()
                .flat_map(|(len, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        vec![Outcome::Failed("worker panicked".to_string()); len]
                    })
                })
                .collect::<Vec<_>>()
        });

        let report = EvaluationReport {
            outcomes: examples
                .iter()
                .cloned()
                .zip(outcomes)
                .map(|(example, outcome)| ExampleOutcome { example, outcome })
                .collect(),
        };

        info!(
            total = report.total(),
            correct = report.correct(),
            failed = report.failed(),
            accuracy = report.accuracy(),
            "Evaluation complete"
        );
        report
    }

    fn score(&self, example: &LabeledExample) -> Outcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            match (&example.article, &example.url) {
                (Some(article), _) => self.service.classify_article(article, &example.subject),
                (None, Some(url)) => self.service.analyze(url, &example.subject),
                (None, None) => Err(MoodError::Dataset("example has no article".to_string())),
            }
        }));

        match result {
            Ok(Ok(r)) if r.sentiment == example.sentiment => Outcome::Match,
            Ok(Ok(r)) => Outcome::Mismatch {
                predicted: r.sentiment,
            },
            Ok(Err(e)) => Outcome::Failed(e.user_message()),
            Err(_) => Outcome::Failed("classifier panicked".to_string()),
        }
    }
}
