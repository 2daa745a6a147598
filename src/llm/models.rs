use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Models that accept `reasoning` and `text.verbosity` request fields.
const REASONING_MODELS: &[&str] = &[
    "o1",
    "o1-mini",
    "o1-preview",
    "o3",
    "o3-mini",
    "o4-mini",
    "gpt-5",
    "gpt-5-mini",
    "gpt-5-nano",
    "codex-mini-latest",
];

/// Prefixes that mark a whole reasoning-capable family.
const REASONING_PREFIXES: &[&str] = &["o1-", "o3-", "o4-", "codex-"];

/// Whether `model` accepts reasoning-effort and verbosity parameters.
///
/// The upstream API rejects those fields for other models, so this must stay
/// exact: the `gpt-5-chat*` family is excluded even though it shares the
/// `gpt-5` prefix.
pub fn supports_reasoning_parameters(model: &str) -> bool {
    REASONING_MODELS.contains(&model)
        || REASONING_PREFIXES.iter().any(|p| model.starts_with(p))
        || (model.starts_with("gpt-5") && !model.starts_with("gpt-5-chat"))
}

/// How much hidden reasoning the model should spend on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    #[default]
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Minimal => "minimal",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningEffort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(ReasoningEffort::Minimal),
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(anyhow::anyhow!(
                "Unknown reasoning effort '{}'. Expected minimal, low, medium or high.",
                other
            )),
        }
    }
}

/// Output verbosity hint for reasoning-capable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Low,
    Medium,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_reasoning_models() {
        for model in REASONING_MODELS {
            assert!(supports_reasoning_parameters(model), "{model}");
        }
    }

    #[test]
    fn test_prefixed_reasoning_models() {
        assert!(supports_reasoning_parameters("o1-2024-12-17"));
        assert!(supports_reasoning_parameters("o3-pro"));
        assert!(supports_reasoning_parameters("o4-mini-high"));
        assert!(supports_reasoning_parameters("codex-large"));
        assert!(supports_reasoning_parameters("gpt-5-2025-08-07"));
        assert!(supports_reasoning_parameters("gpt-5.1"));
    }

    #[test]
    fn test_non_reasoning_models() {
        assert!(!supports_reasoning_parameters("gpt-5-chat"));
        assert!(!supports_reasoning_parameters("gpt-5-chat-latest"));
        assert!(!supports_reasoning_parameters("gpt-4o"));
        assert!(!supports_reasoning_parameters("gpt-4.1-mini"));
        assert!(!supports_reasoning_parameters(""));
        assert!(!supports_reasoning_parameters("o2"));
        assert!(!supports_reasoning_parameters("claude-sonnet"));
        assert!(!supports_reasoning_parameters("gpt-test"));
    }

    #[test]
    fn test_reasoning_effort_parse_and_display() {
        assert_eq!(
            "LOW".parse::<ReasoningEffort>().unwrap(),
            ReasoningEffort::Low
        );
        assert_eq!(
            " medium ".parse::<ReasoningEffort>().unwrap(),
            ReasoningEffort::Medium
        );
        assert!("extreme".parse::<ReasoningEffort>().is_err());
        assert_eq!(ReasoningEffort::High.to_string(), "high");
        assert_eq!(
            serde_json::to_string(&ReasoningEffort::Minimal).unwrap(),
            "\"minimal\""
        );
    }
}
