use super::types::MatchVerdict;
use once_cell::sync::Lazy;
use regex::Regex;

// `regex::Regex` keeps no search cursor between calls, so every line is
// classified on its own regardless of what was matched before it.
static TEST_OPENING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(it|describe)\s*\(\s*['"]"#).expect("test-opening pattern is valid")
});

static GROUP_OPENING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*describe\s*\(\s*['"]"#).expect("group-opening pattern is valid")
});

/// First quoted literal; the closing quote must match the opening one.
static QUOTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(.*?)"|'(.*?)'"#).expect("quoted-name pattern is valid")
});

/// Check whether a line opens an `it(...)` or `describe(...)` block.
///
/// Only the prefix of the line is inspected; anything after the opening
/// quote is irrelevant to the decision.
pub fn is_test_opening(line: &str) -> bool {
    TEST_OPENING.is_match(line)
}

/// Check whether a line opens a `describe(...)` group.
pub fn is_group_opening(line: &str) -> bool {
    GROUP_OPENING.is_match(line)
}

/// Inner text of the first quoted literal on the line, if any.
pub fn extract_test_name(line: &str) -> Option<&str> {
    let caps = QUOTED_NAME.captures(line)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Classify one line of a test file.
pub fn classify(line: &str) -> MatchVerdict {
    if !is_test_opening(line) {
        return MatchVerdict::None;
    }

    MatchVerdict::Matched {
        test_name: extract_test_name(line).unwrap_or_default().to_string(),
        is_group: is_group_opening(line),
    }
}
