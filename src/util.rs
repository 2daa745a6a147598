/// Truncate to at most `max` chars, ending in "..." when something was cut.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }

    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let truncated: String = s.chars().take(max - 3).collect();
    format!("{}...", truncated)
}

/// Format an error with its full cause chain on one line.
pub fn error_chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::{error_chain, truncate};

    #[test]
    fn test_truncate_unicode_safe() {
        let input = "ééééé";
        assert_eq!(truncate(input, 4), "é...");
    }

    #[test]
    fn test_truncate_small_max() {
        let input = "こんにちは";
        assert_eq!(truncate(input, 3), "こんに");
        assert_eq!(truncate(input, 0), "");
        assert_eq!(truncate(input, 10), input);
    }

    #[test]
    fn test_error_chain_includes_context() {
        let err = anyhow::anyhow!("connection reset").context("model call failed");
        assert_eq!(error_chain(&err), "model call failed: connection reset");
    }
}
