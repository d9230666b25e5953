use crate::types::{GenerationConfig, PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A text generation backend: one prompt in, one text payload out.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> String;

    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}

fn generation_error(service: &str, message: impl Into<String>) -> PipelineError {
    PipelineError::Generation {
        service: service.to_string(),
        message: message.into(),
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    service: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(generation_error(
            service,
            format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>()),
        ));
    }
    Ok(response.json::<T>().await?)
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Anthropic Messages API.
pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicService {
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.anthropic_model.clone(),
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl GenerationService for AnthropicService {
    fn name(&self) -> String {
        format!("anthropic ({})", self.model)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let parsed: AnthropicResponse = read_json(&self.name(), response).await?;
        parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| generation_error(&self.name(), "response contained no text"))
    }
}

/// OpenAI Chat Completions API in JSON-object mode.
pub struct OpenAiService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiService {
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationService for OpenAiService {
    fn name(&self) -> String {
        format!("openai ({})", self.model)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: OpenAiResponse = read_json(&self.name(), response).await?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| generation_error(&self.name(), "response contained no text"))
    }
}

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

/// Scripted generation service for development and testing.
///
/// Replies are consumed in order; once the script is exhausted the
/// fallback reply repeats.
pub struct MockGenerationService {
    name: String,
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: AtomicUsize,
    response_delay_ms: u64,
}

impl MockGenerationService {
    pub fn new(name: &str, fallback: MockReply) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            response_delay_ms: 0,
        }
    }

    pub fn always(name: &str, text: impl Into<String>) -> Self {
        Self::new(name, MockReply::Text(text.into()))
    }

    pub fn failing(name: &str) -> Self {
        Self::new(name, MockReply::Fail("service unavailable".to_string()))
    }

    pub fn with_script(self, replies: Vec<MockReply>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies);
        }
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    fn name(&self) -> String {
        format!("mock ({})", self.name)
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }

        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(message) => Err(generation_error(&self.name(), message)),
        }
    }
}

/// Ordered list of interchangeable services, tried primary first.
#[derive(Clone)]
pub struct GenerationChain {
    services: Vec<Arc<dyn GenerationService>>,
}

impl GenerationChain {
    pub fn new(services: Vec<Arc<dyn GenerationService>>) -> Result<Self> {
        if services.is_empty() {
            return Err(PipelineError::Config(
                "no generation service configured".to_string(),
            ));
        }
        Ok(Self { services })
    }

    /// Anthropic first when its key is set, OpenAI after it.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let mut services: Vec<Arc<dyn GenerationService>> = Vec::new();

        if let Some(key) = &config.anthropic_api_key {
            services.push(Arc::new(AnthropicService::new(key.clone(), config)?));
        }
        if let Some(key) = &config.openai_api_key {
            services.push(Arc::new(OpenAiService::new(key.clone(), config)?));
        }

        if services.is_empty() {
            return Err(PipelineError::Config(
                "set ANTHROPIC_API_KEY or OPENAI_API_KEY".to_string(),
            ));
        }

        let chain = Self::new(services)?;
        info!("Generation chain: {}", chain.service_names().join(" -> "));
        Ok(chain)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Runs `parse` over each service's output in order and returns the
    /// first success. Invocation and parse errors both move on to the next
    /// service; the last error is returned when every service fails.
    pub async fn generate_with<T, F>(&self, prompt: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        let mut last_error = None;

        for service in &self.services {
            let outcome = match service.generate(prompt).await {
                Ok(text) => parse(&text),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => {
                    debug!("Generation succeeded with {}", service.name());
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Generation with {} failed: {}", service.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| PipelineError::General("empty generation chain".to_string())))
    }
}
