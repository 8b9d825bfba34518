use anyhow::{anyhow, Context, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client as OpenAIClient;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use ollama_rs::Ollama;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::environment::{Config, LlmKind};
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// Upper bound on a single completion call.
pub const LLM_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 200;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Minimal client for the Gemini `generateContent` REST endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiRequest {
    fn new(prompt: &str, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }
}

impl GeminiResponse {
    /// Text of the first part of the first candidate.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|p| p.text)
    }
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&GeminiRequest::new(prompt, temperature, max_tokens))
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error: {} {}", status, body));
        }

        let parsed: GeminiResponse = response.json().await.context("Invalid Gemini response")?;
        parsed
            .first_text()
            .ok_or_else(|| anyhow!("Gemini response contained no text"))
    }
}

/// Adds a scheme to a bare Ollama host name.
fn ollama_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Builds the configured LLM backend, or `None` when it lacks credentials.
pub fn build_llm_params(config: &Config) -> Option<LLMParams> {
    let (llm_client, default_model) = match config.llm_type {
        LlmKind::Gemini => {
            let key = config.gemini_api_key.as_deref()?;
            (LLMClient::Gemini(GeminiClient::new(key)), DEFAULT_GEMINI_MODEL)
        }
        LlmKind::OpenAI => {
            let key = config.openai_api_key.as_deref()?;
            let openai_config = OpenAIConfig::new().with_api_key(key);
            (
                LLMClient::OpenAI(OpenAIClient::with_config(openai_config)),
                DEFAULT_OPENAI_MODEL,
            )
        }
        LlmKind::Ollama => (
            LLMClient::Ollama(Ollama::new(ollama_url(&config.ollama_host), config.ollama_port)),
            DEFAULT_OLLAMA_MODEL,
        ),
    };

    let params = LLMParams {
        llm_client,
        model: config
            .llm_model
            .clone()
            .unwrap_or_else(|| default_model.to_string()),
        temperature: config.llm_temperature,
        max_tokens: DEFAULT_MAX_TOKENS,
    };
    info!(target: TARGET_LLM_REQUEST, "Using {} with model {}", params.llm_client.name(), params.model);
    Some(params)
}

async fn request_completion(prompt: &str, params: &LLMParams) -> Result<String> {
    match &params.llm_client {
        LLMClient::Gemini(client) => {
            client
                .generate(&params.model, prompt, params.temperature, params.max_tokens)
                .await
        }
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.to_string(), prompt.to_string());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(params.max_tokens as i32),
            );
            let response = ollama.generate(request).await?;
            Ok(response.response)
        }
        LLMClient::OpenAI(client) => {
            let request = CreateChatCompletionRequestArgs::default()
                .model(&params.model)
                .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into()])
                .temperature(params.temperature)
                .max_completion_tokens(params.max_tokens)
                .build()?;
            let response = client.chat().create(request).await?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| anyhow!("OpenAI response contained no text"))
        }
    }
}

/// Sends one prompt to the configured backend.
///
/// A single attempt bounded by [`LLM_TIMEOUT`]; failures and empty answers
/// are logged and come back as `None`.
pub async fn generate_llm_response(prompt: &str, params: &LLMParams) -> Option<String> {
    debug!(target: TARGET_LLM_REQUEST, "Sending {} request with prompt: {}", params.llm_client.name(), prompt);

    match timeout(LLM_TIMEOUT, request_completion(prompt, params)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => {
            debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", text);
            Some(text)
        }
        Ok(Ok(_)) => {
            warn!(target: TARGET_LLM_REQUEST, "LLM returned an empty response");
            None
        }
        Ok(Err(e)) => {
            warn!(target: TARGET_LLM_REQUEST, "Error generating response: {:#}", e);
            None
        }
        Err(_) => {
            warn!(target: TARGET_LLM_REQUEST, "LLM request timed out after {} seconds", LLM_TIMEOUT.as_secs());
            None
        }
    }
}
