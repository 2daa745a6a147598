//! Markdown rendering for backlog story files.

use crate::implementation::{ContextStatus, ImplementationContext};
use crate::story::Story;
use regex::Regex;

const DEFAULT_UNREADABLE: &str = "Repository unreadable";
const NONE_IDENTIFIED: &str = "None identified.";

/// Render a story, optionally followed by an `<implementation_context>` block.
///
/// With `include_block == false` the context is ignored. A missing context
/// with the block requested renders as "None identified.".
pub fn render_story(
    story: &Story,
    context: Option<&ImplementationContext>,
    include_block: bool,
) -> String {
    let base = format!("<user_story>\n{}\n</user_story>", story);
    if !include_block {
        return base;
    }

    let mut lines: Vec<String> = vec![
        base.trim_end().to_string(),
        String::new(),
        "<implementation_context>".to_string(),
    ];
    lines.extend(context_lines(context));
    lines.push("</implementation_context>".to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn context_lines(context: Option<&ImplementationContext>) -> Vec<String> {
    let Some(ctx) = context else {
        return vec![NONE_IDENTIFIED.to_string()];
    };

    match ctx.status {
        ContextStatus::Ok if !ctx.files.is_empty() => {
            let mut lines = vec!["Potentially relevant files:".to_string()];
            lines.extend(ctx.files.iter().map(|f| format!("- {}", f)));
            let notes = ctx.notes.trim();
            if !notes.is_empty() {
                lines.push(String::new());
                lines.push("Notes:".to_string());
                lines.extend(notes.lines().map(|l| l.trim().to_string()));
            }
            lines
        }
        ContextStatus::Unreadable => {
            let reason = if ctx.notes.trim().is_empty() {
                DEFAULT_UNREADABLE
            } else {
                ctx.notes.as_str()
            };
            vec![format!("Repository unreadable: {}", reason)]
        }
        // Disabled is never produced by the loop, and Ok without files
        // cannot be constructed through the public constructors.
        ContextStatus::Ok | ContextStatus::NoneIdentified | ContextStatus::Disabled => {
            vec![NONE_IDENTIFIED.to_string()]
        }
    }
}

/// Filename-safe slug from the first line of a story title.
pub fn slugify(title: &str) -> String {
    let first_line = title.lines().next().unwrap_or_default();
    let lowered = first_line.to_lowercase().replace(['[', ']'], "").replace(' ', "-");
    let non_slug = Regex::new(r"[^a-z0-9-]").unwrap_or_else(|_| Regex::new("$^").unwrap());
    let dashes = Regex::new(r"-{2,}").unwrap_or_else(|_| Regex::new("$^").unwrap());
    let cleaned = non_slug.replace_all(&lowered, "");
    let collapsed = dashes.replace_all(&cleaned, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        "story".to_string()
    } else {
        slug.to_string()
    }
}

/// `NN-<slug>.md` for the `index`-th story (1-based).
pub fn story_filename(index: usize, title: &str) -> String {
    format!("{:02}-{}.md", index, slugify(title))
}
