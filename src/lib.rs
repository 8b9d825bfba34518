pub mod app;
pub mod collector;
pub mod environment;
pub mod geo;
pub mod llm;
pub mod logging;
pub mod news;
pub mod prompts;
pub mod rss;
pub mod store;
pub mod summarizer;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

use crate::llm::GeminiClient;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_PIPELINE: &str = "pipeline";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Gemini(GeminiClient),
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

impl LLMClient {
    pub fn name(&self) -> &'static str {
        match self {
            LLMClient::Gemini(_) => "gemini",
            LLMClient::Ollama(_) => "ollama",
            LLMClient::OpenAI(_) => "openai",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}
