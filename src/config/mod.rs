use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{MoodError, MoodResult};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Safari/605.1.15";

pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => panic!("default cache capacity must be non-zero"),
};

#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub classifier_timeout: Duration,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub cache_capacity: NonZeroUsize,
    /// Keep failed fetches in the cache like successful ones
    pub cache_failures: bool,
    /// Hand "Error: ..." text to the classifier when a fetch fails
    pub classify_fetch_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 4096,
            classifier_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_failures: true,
            classify_fetch_errors: false,
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> MoodResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; unset names keep their defaults
    pub fn from_lookup<F>(lookup: F) -> MoodResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_capacity: usize = parse_var(&lookup, "NEWSMOOD_CACHE_CAPACITY")?
            .unwrap_or(defaults.cache_capacity.get());
        let cache_capacity = NonZeroUsize::new(cache_capacity).ok_or_else(|| {
            MoodError::Config("NEWSMOOD_CACHE_CAPACITY must be greater than zero".to_string())
        })?;

        let fetch_timeout = parse_var::<u64, _>(&lookup, "NEWSMOOD_FETCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let classifier_timeout = parse_var::<u64, _>(&lookup, "NEWSMOOD_CLASSIFIER_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.classifier_timeout);

        Ok(Self {
            ollama_url: lookup("NEWSMOOD_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: lookup("NEWSMOOD_MODEL").unwrap_or(defaults.model),
            api_key: lookup("NEWSMOOD_API_KEY").filter(|k| !k.is_empty()),
            temperature: parse_var(&lookup, "NEWSMOOD_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            max_tokens: parse_var(&lookup, "NEWSMOOD_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            classifier_timeout,
            fetch_timeout,
            user_agent: lookup("NEWSMOOD_USER_AGENT").unwrap_or(defaults.user_agent),
            cache_capacity,
            cache_failures: parse_var(&lookup, "NEWSMOOD_CACHE_FAILURES")?
                .unwrap_or(defaults.cache_failures),
            classify_fetch_errors: parse_var(&lookup, "NEWSMOOD_CLASSIFY_FETCH_ERRORS")?
                .unwrap_or(defaults.classify_fetch_errors),
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> MoodResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MoodError::Config(format!("{} has an invalid value: {}", name, raw))),
    }
}
