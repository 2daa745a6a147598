//! Scripted model client and output-item builders shared by unit tests.

use crate::llm::{OutputItem, ResponseRequest, ResponsesClient};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued turns in order and records every request it sees.
///
/// When the queue runs dry it keeps answering with `repeat`, or fails if no
/// repeat turn was configured.
pub struct ScriptedClient {
    turns: Mutex<VecDeque<anyhow::Result<Vec<OutputItem>>>>,
    repeat: Option<Vec<OutputItem>>,
    requests: Mutex<Vec<ResponseRequest>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<Vec<OutputItem>>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().map(Ok).collect()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(turn: Vec<OutputItem>) -> Self {
        Self {
            repeat: Some(turn),
            ..Self::new(Vec::new())
        }
    }

    pub fn push_error(&self, message: &str) {
        self.turns
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!("{}", message)));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ResponseRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ResponsesClient for ScriptedClient {
    async fn create_response(&self, request: &ResponseRequest) -> anyhow::Result<Vec<OutputItem>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.turns.lock().unwrap().pop_front();
        match next {
            Some(turn) => turn,
            None => self
                .repeat
                .clone()
                .ok_or_else(|| anyhow::anyhow!("script exhausted")),
        }
    }
}

pub fn function_call(name: &str, arguments: serde_json::Value, call_id: &str) -> OutputItem {
    OutputItem(json!({
        "type": "function_call",
        "id": format!("fc_{call_id}"),
        "call_id": call_id,
        "name": name,
        "arguments": arguments.to_string(),
        "status": "completed"
    }))
}

pub fn raw_function_call(name: &str, arguments: &str, call_id: &str) -> OutputItem {
    OutputItem(json!({
        "type": "function_call",
        "call_id": call_id,
        "name": name,
        "arguments": arguments
    }))
}

pub fn reasoning(id: &str) -> OutputItem {
    OutputItem(json!({"type": "reasoning", "id": id, "summary": []}))
}

pub fn message(text: &str) -> OutputItem {
    OutputItem(json!({
        "type": "message",
        "role": "assistant",
        "content": [{"type": "output_text", "text": text}]
    }))
}
