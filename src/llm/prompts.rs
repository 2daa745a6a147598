use crate::story::Story;

/// Prompt for the single-shot backlog breakdown.
pub fn story_breakdown_prompt(prd: &str, tech_spec: &str) -> String {
    format!(
        r#"<task>
Turn the sources below into a backlog of user stories by calling the `create_stories` tool.
</task>

<sources>
<product_requirements>
{prd}
</product_requirements>
<technical_specification>
{tech_spec}
</technical_specification>
</sources>

<coverage>
- Identify the end-user personas named in the sources.
- List every user-facing functional requirement and acceptance test as a capability.
- Drop anything marked as a non-goal and anything that is purely non-functional.
- Write one small, independent story per capability until every capability is covered.
- Put role and permission differences into the acceptance criteria of the affected story.
- Include behavior that only the technical specification mentions only when the requirements corroborate it.
</coverage>

<quality>
- Stories follow INVEST. Each one delivers a single user-facing capability with clear value.
- Use real personas from the sources, never the system or a stakeholder as the actor.
- Do not invent requirements. Leave out anything the sources do not support.
- No duplicates or overlaps. Prefer thin vertical slices.
</quality>

<acceptance_criteria>
- Write each criterion as one Given/When/Then line describing observable behavior.
- Include metrics only when the sources state them.
- Cover the primary flow and the edge cases the sources call out.
</acceptance_criteria>

<format>
Respond only with a `create_stories` call where each story has:
- `title`: "As a <persona>, I want <capability> so that <benefit>."
- `acceptance_criteria`: 3 to 6 Given/When/Then lines.
</format>
"#
    )
}

/// Seed message for the implementation-context loop.
pub fn implementation_context_prompt(story: &Story, tech_spec: &str) -> String {
    format!(
        r#"<task>
Work out where in the repository this story would be implemented.
</task>

<exploration>
Call list_paths and read_file to explore the repository. Paths are relative to the repository root; use "" for the root itself.
Pick the smallest set of concrete files that would need to change.
When you are done, call emit_implementation_context with those files and short notes. Do not answer in prose.
</exploration>

<sources>
<story>
{story}
</story>

<tech_spec>
{tech_spec}
</tech_spec>
</sources>

<notes_guidance>
Keep notes high level: say where to look and what needs to change to satisfy the acceptance criteria, not how to write the code.
Mention any documentation worth reading before making the change.
</notes_guidance>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_prompt_embeds_sources() {
        let prompt = story_breakdown_prompt("Build login", "Use JWT");
        assert!(prompt.contains("Build login"));
        assert!(prompt.contains("Use JWT"));
        assert!(prompt.contains("create_stories"));
    }

    #[test]
    fn test_context_prompt_embeds_story_and_tools() {
        let story = Story::new("As a user, I want to log in", vec!["Given x".to_string()]);
        let prompt = implementation_context_prompt(&story, "Use JWT");
        assert!(prompt.contains("Title: As a user, I want to log in"));
        assert!(prompt.contains("- Given x"));
        assert!(prompt.contains("Use JWT"));
        for tool in ["list_paths", "read_file", "emit_implementation_context"] {
            assert!(prompt.contains(tool), "{tool}");
        }
    }
}
