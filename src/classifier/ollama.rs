use std::time::Instant;

use ollama_chat::{ChatClient, ChatOptions, ChatRequest};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::classifier::prompt::build_messages;
use crate::classifier::traits::SentimentClassifier;
use crate::config::Config;
use crate::domain::{ClassificationRequest, ClassificationResult, Sentiment};
use crate::errors::{MoodError, MoodResult};

/// Classifier backed by a chat model served over the Ollama API
pub struct OllamaClassifier {
    client: ChatClient,
    model: String,
    options: ChatOptions,
}

impl OllamaClassifier {
    pub fn new(config: &Config) -> MoodResult<Self> {
        let client = ollama_chat::create_client(
            &config.ollama_url,
            config.api_key.as_deref(),
            config.classifier_timeout,
        )?;

        Ok(Self {
            client,
            model: config.model.clone(),
            options: ChatOptions {
                temperature: Some(config.temperature),
                num_predict: Some(config.max_tokens),
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the configured model is installed on the backend
    pub fn model_available(&self) -> MoodResult<bool> {
        Ok(self.client.has_model(&self.model)?)
    }

    /// Names of every model the backend can serve
    pub fn available_models(&self) -> MoodResult<Vec<String>> {
        Ok(self
            .client
            .list_models()?
            .into_iter()
            .map(|m| m.name)
            .collect())
    }
}

impl SentimentClassifier for OllamaClassifier {
    #[instrument(level = "info", skip_all, fields(model = %self.model, subject = %request.subject))]
    fn classify(&self, request: &ClassificationRequest) -> MoodResult<ClassificationResult> {
        let messages = build_messages(request);
        for message in &messages {
            debug!(role = ?message.role, content = %message.content, "Prompt message");
        }

        let chat = ChatRequest::json(&self.model, messages, self.options.clone());
        let t0 = Instant::now();
        let response = self.client.chat(&chat)?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            prompt_tokens = response.prompt_eval_count,
            completion_tokens = response.eval_count,
            "Model usage"
        );
        debug!(content = %response.message.content, "Model response");

        parse_classification(&response.message.content)
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    sentiment: String,
    confidence: serde_json::Value,
    #[serde(default)]
    reasoning: String,
}

/// Interpret a model reply. Tolerates prose or code fences around the JSON
/// object, label casing, and a confidence sent as a string.
pub fn parse_classification(content: &str) -> MoodResult<ClassificationResult> {
    let raw = first_object(content)?;

    let sentiment: Sentiment = raw.sentiment.parse().map_err(MoodError::MalformedOutput)?;

    let confidence = match &raw.confidence {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        MoodError::MalformedOutput(format!("confidence is not a number: {}", raw.confidence))
    })?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(MoodError::MalformedOutput(format!(
            "confidence {} is outside 0..=1",
            confidence
        )));
    }

    Ok(ClassificationResult {
        sentiment,
        confidence,
        reasoning: raw.reasoning.trim().to_string(),
    })
}

/// Decode the first complete JSON object in `content`, trying each `{` in
/// turn. Text after the object is ignored.
fn first_object(content: &str) -> MoodResult<RawClassification> {
    let mut first_error = None;

    for (start, _) in content.match_indices('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&content[start..]).into_iter::<RawClassification>();
        match stream.next() {
            Some(Ok(raw)) => return Ok(raw),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    Err(MoodError::MalformedOutput(match first_error {
        Some(e) => e.to_string(),
        None => "no JSON object in model reply".to_string(),
    }))
}
