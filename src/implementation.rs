//! Implementation-context generation.
//!
//! The model explores a sandboxed repository through `list_paths` and
//! `read_file`, then reports the files a story touches with
//! `emit_implementation_context`. The loop is bounded by a model-call budget
//! and always terminates with exactly one [`ContextStatus`].
//!
//! ```text
//! Init -> Validating -> Unreadable                    (no model call)
//!                    -> Iterating -> Ok | NoneIdentified
//! ```

use crate::llm::prompts::implementation_context_prompt;
use crate::llm::tools::{self, ContextToolCall};
use crate::llm::{
    call_model, function_calls, CallOptions, InputItem, OutputItem, ResponsesClient, ToolChoice,
};
use crate::repo::RepoSandbox;
use crate::story::Story;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

pub const FALLBACK_NOTE: &str = "Observed during tool calls";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    Ok,
    NoneIdentified,
    Unreadable,
    /// Never produced by the loop; reserved for callers that skip generation.
    Disabled,
}

impl ContextStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStatus::Ok => "ok",
            ContextStatus::NoneIdentified => "none_identified",
            ContextStatus::Unreadable => "unreadable",
            ContextStatus::Disabled => "disabled",
        }
    }
}

/// Candidate files and notes for one story.
///
/// `status == Ok` exactly when `files` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationContext {
    pub status: ContextStatus,
    pub files: Vec<String>,
    pub notes: String,
}

impl ImplementationContext {
    /// `Ok` with `files`, or `NoneIdentified` when `files` is empty.
    pub fn from_files(files: Vec<String>, notes: impl Into<String>) -> Self {
        let status = if files.is_empty() {
            ContextStatus::NoneIdentified
        } else {
            ContextStatus::Ok
        };
        Self {
            status,
            files,
            notes: notes.into(),
        }
    }

    pub fn none_identified() -> Self {
        Self {
            status: ContextStatus::NoneIdentified,
            files: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self {
            status: ContextStatus::Unreadable,
            files: Vec::new(),
            notes: reason.into(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: ContextStatus::Disabled,
            files: Vec::new(),
            notes: String::new(),
        }
    }
}

/// Budget and fallback tuning for one loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOptions {
    /// Model calls allowed before the loop gives up on a terminal call
    pub max_tool_calls: usize,
    /// Observed paths kept when the budget runs out
    pub fallback_file_limit: usize,
    pub fallback_note: String,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_tool_calls: crate::config::DEFAULT_MAX_TOOL_CALLS,
            fallback_file_limit: crate::config::DEFAULT_FALLBACK_FILE_LIMIT,
            fallback_note: FALLBACK_NOTE.to_string(),
        }
    }
}

/// Paths seen in `list_paths` results, unique and in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct ObservedPaths {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ObservedPaths {
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, paths: I) {
        for path in paths {
            if self.seen.insert(path.clone()) {
                self.order.push(path);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn first(&self, n: usize) -> Vec<String> {
        self.order.iter().take(n).cloned().collect()
    }
}

/// What one model turn did to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Tools ran; ask the model again if budget remains.
    Continue,
    /// The model answered without calling any tool.
    Idle,
    /// The terminal tool was called.
    Emitted(ImplementationContext),
}

/// Loop-local state for one story. Dropped when the loop ends.
#[derive(Debug)]
pub struct ContextSession {
    sandbox: RepoSandbox,
    conversation: Vec<InputItem>,
    observed: ObservedPaths,
    turns_taken: usize,
    options: LoopOptions,
}

impl ContextSession {
    /// Validate the repository and seed the conversation.
    ///
    /// An unreadable repository ends the loop here, before any model call.
    pub fn start(
        repo_root: &Path,
        story: &Story,
        tech_spec: &str,
        options: LoopOptions,
    ) -> Result<Self, ImplementationContext> {
        let sandbox = RepoSandbox::open(repo_root)
            .map_err(|e| ImplementationContext::unreadable(e.reason))?;
        Ok(Self::with_sandbox(sandbox, story, tech_spec, options))
    }

    pub fn with_sandbox(
        sandbox: RepoSandbox,
        story: &Story,
        tech_spec: &str,
        options: LoopOptions,
    ) -> Self {
        Self {
            sandbox,
            conversation: vec![InputItem::user(implementation_context_prompt(
                story, tech_spec,
            ))],
            observed: ObservedPaths::default(),
            turns_taken: 0,
            options,
        }
    }

    pub fn conversation(&self) -> &[InputItem] {
        &self.conversation
    }

    pub fn observed(&self) -> &ObservedPaths {
        &self.observed
    }

    pub fn turns_taken(&self) -> usize {
        self.turns_taken
    }

    pub fn has_budget(&self) -> bool {
        self.turns_taken < self.options.max_tool_calls
    }

    /// Fold one model response into the session.
    ///
    /// Every output item is appended verbatim, then each function call runs
    /// in order. The terminal tool returns immediately, ignoring any calls
    /// that follow it in the same turn.
    pub fn apply_turn(&mut self, output: Vec<OutputItem>) -> TurnOutcome {
        self.turns_taken += 1;
        let calls = function_calls(&output);
        self.conversation.extend(output.into_iter().map(InputItem::Echo));

        if calls.is_empty() {
            debug!(turn = self.turns_taken, "model answered without tool calls");
            return TurnOutcome::Idle;
        }

        for call in &calls {
            let decoded = ContextToolCall::decode(call);
            debug!(turn = self.turns_taken, tool = decoded.name(), "tool call");
            let output = match decoded {
                ContextToolCall::ListPaths { directory } => {
                    let listing = self.sandbox.list_paths(&directory);
                    self.observed.extend(listing.paths.iter().cloned());
                    encode(&listing)
                }
                ContextToolCall::ReadFile { path } => encode(&self.sandbox.read_file(&path)),
                ContextToolCall::EmitContext { files, notes } => {
                    return TurnOutcome::Emitted(ImplementationContext::from_files(files, notes));
                }
                ContextToolCall::Unknown { .. } => serde_json::json!({"ignored": true}).to_string(),
            };
            if !call.call_id.is_empty() {
                self.conversation
                    .push(InputItem::function_output(call.call_id.clone(), output));
            }
        }
        TurnOutcome::Continue
    }

    /// Result when the loop ends without a terminal call.
    pub fn finish(self) -> ImplementationContext {
        let files = self.observed.first(self.options.fallback_file_limit);
        if files.is_empty() {
            ImplementationContext::none_identified()
        } else {
            ImplementationContext::from_files(files, self.options.fallback_note)
        }
    }
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Run the tool-calling loop for one story.
///
/// Tool failures never surface here; only model calls can fail, and those
/// errors propagate so the caller can decide how to degrade.
pub async fn generate_implementation_context<C: ResponsesClient>(
    client: &C,
    call_options: &CallOptions,
    story: &Story,
    tech_spec: &str,
    repo_root: &Path,
    options: LoopOptions,
) -> anyhow::Result<ImplementationContext> {
    let mut session = match ContextSession::start(repo_root, story, tech_spec, options) {
        Ok(session) => session,
        Err(unreadable) => {
            info!(reason = %unreadable.notes, "repository unreadable, skipping tool loop");
            return Ok(unreadable);
        }
    };
    let tools = tools::context_tools();

    while session.has_budget() {
        let output = call_model(
            client,
            call_options,
            session.conversation(),
            &tools,
            ToolChoice::Auto,
        )
        .await?;

        match session.apply_turn(output) {
            TurnOutcome::Continue => {}
            TurnOutcome::Idle => break,
            TurnOutcome::Emitted(context) => {
                info!(
                    turns = session.turns_taken(),
                    files = context.files.len(),
                    status = context.status.as_str(),
                    "implementation context emitted"
                );
                return Ok(context);
            }
        }
    }

    let turns = session.turns_taken();
    let observed = session.observed().len();
    let context = session.finish();
    info!(
        turns,
        observed,
        status = context.status.as_str(),
        "tool loop ended without a terminal call"
    );
    Ok(context)
}
