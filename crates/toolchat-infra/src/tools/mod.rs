//! Built-in HTTP tools: weather, F1 schedule, stock quotes.
//!
//! Each tool keeps the upstream response mapping in a pure function so it
//! can be tested without the network. Upstream failures become
//! `ToolOutput::Failure` with a message meant for the model.

pub mod f1;
pub mod stock;
pub mod weather;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use toolchat_core::tool::catalog::ToolCatalog;
use toolchat_types::config::ToolsConfig;
use toolchat_types::error::ToolError;

use crate::config::api_key_from_env;
use f1::F1ScheduleTool;
use stock::StockPriceTool;
use weather::WeatherTool;

const TOOL_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Register the built-in tools with keys read from the environment.
///
/// A tool whose key is missing is still registered; it answers every call
/// with a "not configured" failure.
pub fn builtin_catalog(config: &ToolsConfig) -> ToolCatalog {
    let client = reqwest::Client::builder()
        .timeout(TOOL_HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client for tools");
            reqwest::Client::new()
        });

    let weather_key = api_key_from_env(&config.weather_api_key_env);
    let stock_key = api_key_from_env(&config.stock_api_key_env);
    if weather_key.is_none() {
        tracing::debug!(var = %config.weather_api_key_env, "Weather API key not set");
    }
    if stock_key.is_none() {
        tracing::debug!(var = %config.stock_api_key_env, "Stock API key not set");
    }

    ToolCatalog::new()
        .with(WeatherTool::new(
            client.clone(),
            &config.weather_base_url,
            weather_key,
        ))
        .with(F1ScheduleTool::new(client.clone(), &config.f1_base_url))
        .with(StockPriceTool::new(client, &config.stock_base_url, stock_key))
}

/// Deserialize tool arguments, naming the tool on failure.
fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}
