use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are dropped.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    split_list(&env::var(var).unwrap_or_default(), delimiter)
}

fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads a non-empty environment variable.
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an environment variable, falling back to `default` when
/// it is unset or invalid.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    match get_env_var(var) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value '{}' for {}", raw, var);
            default
        }),
        None => default,
    }
}

/// Loads `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {}", e),
    }
}

/// Which datastore backs the news collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreKind {
    Notion,
    Sqlite,
}

/// Which LLM backend performs enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmKind {
    Gemini,
    Ollama,
    OpenAI,
}

impl FromStr for LlmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(LlmKind::Gemini),
            "ollama" => Ok(LlmKind::Ollama),
            "openai" => Ok(LlmKind::OpenAI),
            other => Err(format!("unknown LLM_TYPE '{}'", other)),
        }
    }
}

/// Process-wide settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub datastore: DatastoreKind,
    pub notion_api_key: Option<String>,
    pub notion_database_id: Option<String>,
    pub database_path: PathBuf,
    pub llm_type: LlmKind,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_host: String,
    pub ollama_port: u16,
    pub llm_model: Option<String>,
    pub llm_temperature: f32,
    pub summary_language: String,
    pub item_delay: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let notion_database_id = get_env_var("NOTION_DATABASE_ID");
        let datastore = match get_env_var("DATASTORE").map(|v| v.to_ascii_lowercase()) {
            Some(ref v) if v == "notion" => DatastoreKind::Notion,
            Some(ref v) if v == "sqlite" => DatastoreKind::Sqlite,
            Some(other) => {
                warn!("Unknown DATASTORE '{}', choosing by configuration", other);
                Self::default_datastore(notion_database_id.is_some())
            }
            None => Self::default_datastore(notion_database_id.is_some()),
        };

        let gemini_api_key = get_env_var("GEMINI_API_KEY");
        let openai_api_key = get_env_var("OPENAI_API_KEY");
        let llm_type = match get_env_var("LLM_TYPE") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, using gemini", e);
                LlmKind::Gemini
            }),
            None if gemini_api_key.is_none() && openai_api_key.is_some() => LlmKind::OpenAI,
            None => LlmKind::Gemini,
        };

        Self {
            datastore,
            notion_api_key: get_env_var("NOTION_API_KEY"),
            notion_database_id,
            database_path: PathBuf::from(
                get_env_var("DATABASE_PATH").unwrap_or_else(|| "newsglobe.db".to_string()),
            ),
            llm_type,
            gemini_api_key,
            openai_api_key,
            ollama_host: get_env_var("OLLAMA_HOST").unwrap_or_else(|| "localhost".to_string()),
            ollama_port: get_env_var_or("OLLAMA_PORT", 11434),
            llm_model: get_env_var("LLM_MODEL"),
            llm_temperature: get_env_var_or("LLM_TEMPERATURE", 0.3),
            summary_language: get_env_var("SUMMARY_LANGUAGE")
                .unwrap_or_else(|| "English".to_string()),
            item_delay: Duration::from_millis(get_env_var_or("ITEM_DELAY_MS", 1200)),
            port: get_env_var_or("PORT", 8080),
        }
    }

    fn default_datastore(notion_configured: bool) -> DatastoreKind {
        if notion_configured {
            DatastoreKind::Notion
        } else {
            DatastoreKind::Sqlite
        }
    }
}
