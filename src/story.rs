use serde::{Deserialize, Serialize};
use std::fmt;

/// A single backlog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub acceptance_criteria: Vec<String>,
}

impl Story {
    pub fn new(title: impl Into<String>, acceptance_criteria: Vec<String>) -> Self {
        Self {
            title: title.into(),
            acceptance_criteria,
        }
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f)?;
        writeln!(f, "Acceptance Criteria:")?;
        if self.acceptance_criteria.is_empty() {
            // Keep the bullet so the section never renders empty.
            return writeln!(f, "- ");
        }
        for criterion in &self.acceptance_criteria {
            writeln!(f, "- {}", criterion)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CreateStoriesArgs {
    stories: Vec<Story>,
}

/// Parse the arguments of a `create_stories` call.
pub fn parse_create_stories(arguments: &str) -> anyhow::Result<Vec<Story>> {
    let args: CreateStoriesArgs = serde_json::from_str(arguments)
        .map_err(|e| anyhow::anyhow!("Malformed create_stories arguments: {}", e))?;
    Ok(args.stories)
}
