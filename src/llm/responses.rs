//! Wire types for the Responses API.
//!
//! Model output items are kept as raw JSON so they can be echoed back into the
//! next request exactly as received. Multi-turn tool use depends on the model
//! seeing its own reasoning and function-call items again.

use super::models::{ReasoningEffort, Verbosity};
use super::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item of request input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputItem {
    Message(InputMessage),
    FunctionCallOutput(FunctionCallOutput),
    /// A model output item fed back verbatim.
    Echo(OutputItem),
}

impl InputItem {
    pub fn user(content: impl Into<String>) -> Self {
        InputItem::Message(InputMessage {
            role: "user".to_string(),
            content: content.into(),
        })
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        InputItem::FunctionCallOutput(FunctionCallOutput {
            item_type: "function_call_output".to_string(),
            call_id: call_id.into(),
            output: output.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCallOutput {
    #[serde(rename = "type")]
    pub item_type: String,
    pub call_id: String,
    pub output: String,
}

/// A raw output item from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputItem(pub Value);

impl OutputItem {
    pub fn item_type(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    /// Decode this item as a function call, if it is one.
    pub fn as_function_call(&self) -> Option<FunctionCall> {
        if self.item_type() != "function_call" {
            return None;
        }
        serde_json::from_value(self.0.clone()).ok()
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    /// JSON-encoded arguments.
    #[serde(default)]
    pub arguments: String,
    #[serde(default)]
    pub call_id: String,
}

/// Collect every function call in `items`, preserving order.
pub fn function_calls(items: &[OutputItem]) -> Vec<FunctionCall> {
    items.iter().filter_map(OutputItem::as_function_call).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReasoningConfig {
    pub effort: ReasoningEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextConfig {
    pub verbosity: Verbosity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRequest {
    pub model: String,
    pub tools: Vec<ToolDefinition>,
    pub input: Vec<InputItem>,
    pub tool_choice: ToolChoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseBody {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Deserialize)]
pub(crate) struct ApiError {
    pub message: String,
}
