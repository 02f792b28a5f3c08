//! Tool declarations and execution results.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// What a tool tells the model about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// Result of running a tool.
///
/// Failures are data, not errors: they are reported back to the model and
/// persisted like any other result, in the `{ "error": true, "message" }` shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Success(serde_json::Value),
    Failure { message: String },
}

impl ToolOutput {
    pub fn failure(message: impl Into<String>) -> Self {
        ToolOutput::Failure {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Failure { .. })
    }

    pub fn into_value(self) -> serde_json::Value {
        match self {
            ToolOutput::Success(value) => value,
            ToolOutput::Failure { message } => json!({ "error": true, "message": message }),
        }
    }
}
