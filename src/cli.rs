//! Command-line entry point: argument parsing, input validation, and the
//! end-of-run summary.

use crate::backlog::{
    check_repo_root, generate_stories, write_backlog, BacklogSession, WrittenStory,
};
use crate::config::Settings;
use crate::llm::{OpenAiClient, ResponsesClient};
use crate::spinner::spin_while;
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Instrument};

#[derive(Parser, Debug)]
#[command(
    name = "storyloom",
    about = "Turn a PRD and tech spec into a backlog of context-enriched user stories",
    version
)]
pub struct Args {
    /// Path to the Product Requirements Document
    #[arg(long)]
    pub prd: PathBuf,

    /// Path to the Technical Specification
    #[arg(long)]
    pub tech_spec: PathBuf,

    /// Local repository to explore for implementation context
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Directory the story files are written to
    #[arg(long, default_value = ".")]
    pub target_dir: PathBuf,

    /// Model name, overriding MODEL and the config file
    #[arg(long)]
    pub model: Option<String>,

    /// Append JSON log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Validated inputs, read before any model call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub prd: String,
    pub tech_spec: String,
    pub repo: Option<PathBuf>,
    pub target_dir: PathBuf,
}

impl Inputs {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        if !args.prd.exists() {
            anyhow::bail!("PRD file not found: {}", args.prd.display());
        }
        if !args.tech_spec.exists() {
            anyhow::bail!("Tech spec file not found: {}", args.tech_spec.display());
        }
        if !args.target_dir.exists() {
            anyhow::bail!("Target directory not found: {}", args.target_dir.display());
        }
        if !args.target_dir.is_dir() {
            anyhow::bail!(
                "Target path is not a directory: {}",
                args.target_dir.display()
            );
        }
        if let Some(repo) = &args.repo {
            check_repo_root(repo)?;
        }

        Ok(Self {
            prd: read_input(&args.prd)?,
            tech_spec: read_input(&args.tech_spec)?,
            repo: args.repo.clone(),
            target_dir: args.target_dir.clone(),
        })
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run one backlog generation from parsed arguments.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let inputs = Inputs::from_args(&args)?;
    let mut settings = Settings::load()?;
    if let Some(model) = args.model {
        settings.model = model;
    }

    let mut stdout = io::stdout();
    print_settings(&mut stdout, &settings)?;

    let client = OpenAiClient::from_settings(&settings)?;
    let session = BacklogSession::new(&settings);
    execute(&client, &session, &inputs, &mut stdout).await?;
    Ok(())
}

/// Both generation phases under the run span, each behind a spinner, then
/// the summary.
pub async fn execute<C: ResponsesClient, W: Write>(
    client: &C,
    session: &BacklogSession,
    inputs: &Inputs,
    out: &mut W,
) -> anyhow::Result<Vec<WrittenStory>> {
    let span = session.span();
    span.in_scope(|| info!("starting backlog run"));

    let stories = spin_while(
        "Breaking the PRD into stories...",
        generate_stories(client, &session.story_call, &inputs.prd, &inputs.tech_spec)
            .instrument(span.clone()),
    )
    .await?;

    let message = match &inputs.repo {
        Some(_) => format!(
            "Gathering implementation context for {} stories...",
            stories.len()
        ),
        None => format!("Writing {} stories...", stories.len()),
    };
    let written = spin_while(
        &message,
        write_backlog(
            client,
            session,
            &stories,
            &inputs.tech_spec,
            inputs.repo.as_deref(),
            &inputs.target_dir,
        )
        .instrument(span),
    )
    .await?;

    print_summary(out, &written)?;
    Ok(written)
}

pub fn print_settings<W: Write>(out: &mut W, settings: &Settings) -> io::Result<()> {
    writeln!(out, "Model: {}", settings.model)?;
    writeln!(out, "Reasoning Effort: {}", settings.reasoning_effort)?;
    writeln!(out)
}

/// List the written files, then print each one under a `~` underline.
pub fn print_summary<W: Write>(out: &mut W, written: &[WrittenStory]) -> io::Result<()> {
    writeln!(out, "Successfully created:")?;
    for (idx, story) in written.iter().enumerate() {
        writeln!(out, "{}. {}", idx + 1, story.filename)?;
    }
    for story in written {
        writeln!(out)?;
        writeln!(out, "{}", story.filename)?;
        writeln!(out, "{}", "~".repeat(story.filename.chars().count()))?;
        writeln!(out, "{}", story.content)?;
    }
    out.flush()
}
