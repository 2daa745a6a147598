//! Backlog generation: break a PRD into stories, enrich each one with
//! implementation context, and write one markdown file per story.

use crate::config::Settings;
use crate::implementation::{generate_implementation_context, ImplementationContext, LoopOptions};
use crate::llm::prompts::story_breakdown_prompt;
use crate::llm::tools::{self, CREATE_STORIES};
use crate::llm::{
    call_model, function_calls, CallOptions, InputItem, ReasoningEffort, ResponsesClient,
    ToolChoice,
};
use crate::render::{render_story, story_filename};
use crate::repo::validate_repo_root;
use crate::story::{parse_create_stories, Story};
use crate::util::error_chain;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-run state owned by the caller for the lifetime of one backlog run.
#[derive(Debug, Clone)]
pub struct BacklogSession {
    pub run_id: Uuid,
    /// Options for the single-shot breakdown call
    pub story_call: CallOptions,
    /// Options for every call inside the context loop
    pub context_call: CallOptions,
    pub loop_options: LoopOptions,
}

impl BacklogSession {
    pub fn new(settings: &Settings) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            story_call: CallOptions::new(
                settings.model.clone(),
                ReasoningEffort::Medium,
                settings.request_timeout,
            ),
            context_call: CallOptions::new(
                settings.model.clone(),
                settings.reasoning_effort,
                settings.request_timeout,
            ),
            loop_options: LoopOptions {
                max_tool_calls: settings.max_tool_calls,
                fallback_file_limit: settings.fallback_file_limit,
                ..LoopOptions::default()
            },
        }
    }

    /// Span that tags every event of this run with its `run_id`.
    pub fn span(&self) -> tracing::Span {
        info_span!("backlog", run_id = %self.run_id)
    }
}

/// Top-level repository check, run before any model call.
///
/// Fails for a missing path, a non-directory, or a directory that cannot be
/// listed.
pub fn check_repo_root(root: &Path) -> anyhow::Result<()> {
    validate_repo_root(root).map_err(|e| {
        debug!(path = %root.display(), reason = %e, "repository rejected");
        anyhow::anyhow!(
            "Repository not found or not a directory: {}",
            root.display()
        )
    })
}

/// A story file written to the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenStory {
    pub filename: String,
    pub path: PathBuf,
    pub content: String,
}

/// Ask the model to break the PRD and tech spec into stories.
pub async fn generate_stories<C: ResponsesClient>(
    client: &C,
    options: &CallOptions,
    prd: &str,
    tech_spec: &str,
) -> anyhow::Result<Vec<Story>> {
    let input = vec![InputItem::user(story_breakdown_prompt(prd, tech_spec))];
    let output = call_model(
        client,
        options,
        &input,
        &[tools::create_stories_tool()],
        ToolChoice::Required,
    )
    .await?;

    let mut stories = Vec::new();
    for call in function_calls(&output) {
        if call.name == CREATE_STORIES {
            stories.extend(parse_create_stories(&call.arguments)?);
        }
    }
    info!(count = stories.len(), "stories generated");
    Ok(stories)
}

/// Context for one story. Model failures are downgraded to `unreadable` so
/// the rest of the run carries on.
async fn context_for_story<C: ResponsesClient>(
    client: &C,
    session: &BacklogSession,
    story: &Story,
    tech_spec: &str,
    repo_root: &Path,
) -> ImplementationContext {
    match generate_implementation_context(
        client,
        &session.context_call,
        story,
        tech_spec,
        repo_root,
        session.loop_options.clone(),
    )
    .await
    {
        Ok(context) => context,
        Err(err) => {
            let reason = error_chain(&err);
            warn!(error = %reason, "implementation context failed");
            ImplementationContext::unreadable(reason)
        }
    }
}

/// Render and write each story in order, numbering files from 1.
///
/// With `repo_root == None` the files carry no implementation-context block.
pub async fn write_backlog<C: ResponsesClient>(
    client: &C,
    session: &BacklogSession,
    stories: &[Story],
    tech_spec: &str,
    repo_root: Option<&Path>,
    target_dir: &Path,
) -> anyhow::Result<Vec<WrittenStory>> {
    let mut written = Vec::with_capacity(stories.len());
    for (idx, story) in stories.iter().enumerate() {
        let number = idx + 1;
        let span = info_span!("story", story_index = number);
        let content = async {
            match repo_root {
                Some(root) => {
                    let context = context_for_story(client, session, story, tech_spec, root).await;
                    info!(
                        status = context.status.as_str(),
                        files = context.files.len(),
                        "context ready"
                    );
                    render_story(story, Some(&context), true)
                }
                None => render_story(story, None, false),
            }
        }
        .instrument(span)
        .await;

        let filename = story_filename(number, &story.title);
        let path = target_dir.join(&filename);
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(WrittenStory {
            filename,
            path,
            content,
        });
    }
    Ok(written)
}

/// Full run: validate inputs, generate stories, then write the backlog.
pub async fn build_backlog<C: ResponsesClient>(
    client: &C,
    session: &BacklogSession,
    prd: &str,
    tech_spec: &str,
    repo_root: Option<&Path>,
    target_dir: &Path,
) -> anyhow::Result<Vec<WrittenStory>> {
    if let Some(root) = repo_root {
        check_repo_root(root)?;
    }

    async {
        let stories = generate_stories(client, &session.story_call, prd, tech_spec).await?;
        write_backlog(client, session, &stories, tech_spec, repo_root, target_dir).await
    }
    .instrument(session.span())
    .await
}
