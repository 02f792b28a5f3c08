//! Application configuration types.
//!
//! `AppConfig` represents `config.toml` in the data directory. Every field
//! has a default so a missing or partial file still yields a usable config.

use serde::{Deserialize, Serialize};

/// Top-level configuration for toolchat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity that owns the sessions created from this installation.
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Overall wall-clock ceiling for one inference stream.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,

    /// Maximum model turns per assistant response (tool call rounds included).
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,

    /// Session titles are cut to this many characters.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_owner_id() -> String {
    "local".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant with access to real-world tools. You can:\n\
     1. Get Weather: fetch current weather data for any city. When asked about weather, always use the getWeather tool.\n\
     2. Get F1 Matches: fetch the next upcoming Formula 1 race and current season info. When asked about F1 or racing, use the getF1Matches tool.\n\
     3. Get Stock Prices: fetch the latest price for any publicly traded company. When asked about stocks or share prices, use the getStockPrice tool.\n\n\
     After getting tool results, give a clear and friendly summary. If a tool returns an error, explain the issue helpfully. \
     For general questions, respond naturally."
        .to_string()
}

fn default_stream_timeout_secs() -> u64 {
    60
}

fn default_max_tool_steps() -> u32 {
    3
}

fn default_title_max_chars() -> usize {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            model: ModelConfig::default(),
            system_prompt: default_system_prompt(),
            stream_timeout_secs: default_stream_timeout_secs(),
            max_tool_steps: default_max_tool_steps(),
            title_max_chars: default_title_max_chars(),
            tools: ToolsConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// Endpoints and credentials for the built-in tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub weather_base_url: String,
    pub weather_api_key_env: String,
    pub f1_base_url: String,
    pub stock_base_url: String,
    pub stock_api_key_env: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            weather_api_key_env: "OPENWEATHERMAP_API_KEY".to_string(),
            f1_base_url: "https://api.jolpi.ca/ergast/f1".to_string(),
            stock_base_url: "https://www.alphavantage.co".to_string(),
            stock_api_key_env: "ALPHA_VANTAGE_API_KEY".to_string(),
        }
    }
}
