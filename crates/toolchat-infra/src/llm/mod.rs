//! Model client implementations.

pub mod openai_compat;

use std::sync::Arc;

use toolchat_core::llm::provider::InferenceProvider;
use toolchat_core::llm::tool_loop::ToolLoopProvider;
use toolchat_core::tool::catalog::ToolCatalog;
use toolchat_types::config::AppConfig;
use toolchat_types::error::InferenceError;

use crate::config::api_key_from_env;
use openai_compat::OpenAiCompatClient;

/// Build the inference provider for the configured model and tools.
///
/// Fails with `AuthenticationFailed` when the API key variable is unset.
pub fn build_provider(
    config: &AppConfig,
    catalog: Arc<ToolCatalog>,
) -> Result<Arc<dyn InferenceProvider>, InferenceError> {
    let Some(api_key) = api_key_from_env(&config.model.api_key_env) else {
        tracing::error!(var = %config.model.api_key_env, "Model API key is not set");
        return Err(InferenceError::AuthenticationFailed);
    };

    let client = OpenAiCompatClient::new(&config.model, api_key)?;
    tracing::info!(
        model = %config.model.model,
        base_url = %config.model.base_url,
        tools = catalog.len(),
        "Model provider ready"
    );
    Ok(Arc::new(ToolLoopProvider::new(
        Arc::new(client),
        catalog,
        config.max_tool_steps,
    )))
}
