//! Text generation client for explanatory questions.
//!
//! Supports OpenAI-compatible chat endpoints (Groq and friends) and Ollama,
//! plus a fake client for tests. Calls are blocking with a client-side
//! timeout; callers treat every error as "collaborator unavailable".

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a CAN Data Dictionary expert.\n\
Answer based ONLY on this context:";

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
    /// Cap on the context handed to the model
    #[serde(default = "default_max_context_bytes")]
    pub max_context_bytes: usize,
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_context_bytes() -> usize {
    4096
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            max_context_bytes: default_max_context_bytes(),
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// Something that answers a question given a bounded context
pub trait TextGenerator: Send + Sync {
    fn generate(&self, context: &str, question: &str) -> Result<String, LlmError>;
}

/// HTTP client for OpenAI-compatible and Ollama endpoints
pub struct HttpLlmClient {
    config: LlmConfig,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Check if endpoint is Ollama-style
    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::HttpError(format!("Request failed: {}", e))
        }
    }

    /// Call Ollama-style API
    fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));

        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        non_empty(response_json.get("response").and_then(|v| v.as_str()))
    }

    /// Call OpenAI-compatible API
    fn call_openai_compatible(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut request = self.client.post(&url).json(&request_body);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        non_empty(
            response_json
                .get("choices")
                .and_then(|v| v.get(0))
                .and_then(|v| v.get("message"))
                .and_then(|v| v.get("content"))
                .and_then(|v| v.as_str()),
        )
    }
}

impl TextGenerator for HttpLlmClient {
    fn generate(&self, context: &str, question: &str) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let prompt = build_prompt(context, question);

        if self.is_ollama_endpoint() {
            self.call_ollama(&prompt)
        } else {
            self.call_openai_compatible(&prompt)
        }
    }
}

/// Full prompt sent to the model
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("{}\n\n{}\n\nQuestion: {}", SYSTEM_PROMPT, context, question)
}

fn non_empty(text: Option<&str>) -> Result<String, LlmError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(LlmError::EmptyResponse),
    }
}

/// Fake text generator for testing
pub struct FakeLlmClient {
    responses: std::sync::Mutex<Vec<Result<String, LlmError>>>,
    call_count: std::sync::Mutex<usize>,
    last_context: std::sync::Mutex<Option<String>>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            call_count: std::sync::Mutex::new(0),
            last_context: std::sync::Mutex::new(None),
        }
    }

    /// Create a fake client that always answers with `text`
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Context passed on the most recent call
    pub fn last_context(&self) -> Option<String> {
        self.last_context
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl TextGenerator for FakeLlmClient {
    fn generate(&self, context: &str, _question: &str) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        *self.last_context.lock().unwrap_or_else(|e| e.into_inner()) = Some(context.to_string());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            // Keep returning the same response
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}
