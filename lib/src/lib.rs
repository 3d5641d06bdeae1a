//! Blocking bindings for an Ollama-compatible chat API
//! Provides functions to list installed models and run a single non-streaming chat turn

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling options forwarded to the model runner
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Non-streaming request that asks the server to constrain output to JSON
    pub fn json(model: &str, messages: Vec<ChatMessage>, options: ChatOptions) -> Self {
        Self {
            model: model.to_string(),
            messages,
            stream: false,
            format: Some("json".to_string()),
            options,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
    /// Tokens in the prompt, when the server reports usage
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Tokens generated, when the server reports usage
    #[serde(default)]
    pub eval_count: Option<u64>,
    /// Wall time in nanoseconds
    #[serde(default)]
    pub total_duration: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<Model>,
}

pub struct ChatClient {
    url: String,
    client: Client,
}

impl ChatClient {
    pub fn new(url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|_| ChatError::InvalidHeader)?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// List all models installed on the server
    pub fn list_models(&self) -> Result<Vec<Model>, ChatError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.url))
            .send()?
            .error_for_status()?;

        let wrapper: TagsResponse = response.json()?;
        Ok(wrapper.models)
    }

    /// Check whether a model with the given name is installed
    pub fn has_model(&self, name: &str) -> Result<bool, ChatError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.name == name))
    }

    /// Run one chat turn and return the complete assistant message
    pub fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(request)
            .send()?;

        // Ollama answers 404 when the model has not been pulled
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ChatError::ModelNotFound(request.model.clone()));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChatError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json()?)
    }
}

/// Create a new chat client
pub fn create_client(
    url: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<ChatClient, ChatError> {
    ChatClient::new(url, api_key, timeout)
}
