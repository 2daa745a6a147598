pub mod client;
pub mod models;
pub mod prompts;
pub mod responses;
pub mod tools;

pub use client::{OpenAiClient, ResponsesClient};
pub use models::{supports_reasoning_parameters, ReasoningEffort, Verbosity};
pub use responses::{
    function_calls, FunctionCall, InputItem, OutputItem, ReasoningConfig, ResponseRequest,
    TextConfig, ToolChoice,
};
pub use tools::{ContextToolCall, ToolDefinition};

use std::time::Duration;

/// Per-call parameters shared by every request in one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    pub model: String,
    pub effort: ReasoningEffort,
    pub verbosity: Verbosity,
    pub timeout: Duration,
}

impl CallOptions {
    pub fn new(model: impl Into<String>, effort: ReasoningEffort, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            effort,
            verbosity: Verbosity::Low,
            timeout,
        }
    }
}

/// Build a request, adding reasoning and verbosity only for models that
/// accept them.
pub fn build_request(
    options: &CallOptions,
    input: &[InputItem],
    tools: &[ToolDefinition],
    tool_choice: ToolChoice,
) -> ResponseRequest {
    let reasoning_capable = supports_reasoning_parameters(&options.model);
    ResponseRequest {
        model: options.model.clone(),
        tools: tools.to_vec(),
        input: input.to_vec(),
        tool_choice,
        reasoning: reasoning_capable.then_some(ReasoningConfig {
            effort: options.effort,
        }),
        text: reasoning_capable.then_some(TextConfig {
            verbosity: options.verbosity,
        }),
    }
}

/// One request/response exchange with the model, bounded by `options.timeout`.
pub async fn call_model<C: ResponsesClient>(
    client: &C,
    options: &CallOptions,
    input: &[InputItem],
    tools: &[ToolDefinition],
    tool_choice: ToolChoice,
) -> anyhow::Result<Vec<OutputItem>> {
    let request = build_request(options, input, tools, tool_choice);
    match tokio::time::timeout(options.timeout, client.create_response(&request)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "Model call timed out after {}s",
            options.timeout.as_secs()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        requests: Mutex<Vec<ResponseRequest>>,
    }

    impl ResponsesClient for Recorder {
        async fn create_response(
            &self,
            request: &ResponseRequest,
        ) -> anyhow::Result<Vec<OutputItem>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(Vec::new())
        }
    }

    struct Hangs;

    impl ResponsesClient for Hangs {
        async fn create_response(
            &self,
            _request: &ResponseRequest,
        ) -> anyhow::Result<Vec<OutputItem>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn options(model: &str) -> CallOptions {
        CallOptions::new(model, ReasoningEffort::Medium, Duration::from_secs(5))
    }

    #[test]
    fn test_reasoning_fields_only_for_capable_models() {
        let input = vec![InputItem::user("hi")];
        let tools = tools::context_tools();

        let request = build_request(&options("gpt-5"), &input, &tools, ToolChoice::Auto);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["reasoning"]["effort"], "medium");
        assert_eq!(json["text"]["verbosity"], "low");

        for model in ["gpt-4o", "gpt-5-chat-latest", ""] {
            let request = build_request(&options(model), &input, &tools, ToolChoice::Auto);
            let json = serde_json::to_value(&request).unwrap();
            assert!(json.get("reasoning").is_none(), "{model}");
            assert!(json.get("text").is_none(), "{model}");
        }
    }

    #[tokio::test]
    async fn test_call_model_forwards_request() {
        let recorder = Recorder {
            requests: Mutex::new(Vec::new()),
        };
        let input = vec![InputItem::user("hi")];
        let tools = vec![tools::create_stories_tool()];
        call_model(
            &recorder,
            &options("o3"),
            &input,
            &tools,
            ToolChoice::Required,
        )
        .await
        .unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "o3");
        assert_eq!(requests[0].tool_choice, ToolChoice::Required);
        assert_eq!(requests[0].input, input);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_model_times_out() {
        let err = call_model(
            &Hangs,
            &options("gpt-4o"),
            &[InputItem::user("hi")],
            &[],
            ToolChoice::Auto,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
