use serde::{Deserialize, Serialize};

/// Column where every lens range ends; lenses only need a visual anchor.
pub const LENS_COLUMN_SPAN: u32 = 5;

/// One physical line of a document, borrowed for the duration of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub index: usize,
    pub text: &'a str,
}

/// Verdict of the line classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchVerdict {
    None,
    Matched { test_name: String, is_group: bool },
}

impl MatchVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchVerdict::Matched { .. })
    }
}

/// What clicking a lens does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Run,
    RunGroup,
    Debug,
}

impl ActionKind {
    /// Host command id the action is wired to. Groups run through the same
    /// command as single tests; only the grep filter differs.
    pub fn command_id(self) -> &'static str {
        match self {
            ActionKind::Run | ActionKind::RunGroup => RUN_TEST_COMMAND,
            ActionKind::Debug => DEBUG_TEST_COMMAND,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Run => "Run test",
            ActionKind::RunGroup => "Run tests",
            ActionKind::Debug => "Debug test",
        }
    }
}

pub const RUN_TEST_COMMAND: &str = "protractor.runTest";
pub const DEBUG_TEST_COMMAND: &str = "protractor.debugTest";

/// Arguments every action needs to invoke protractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionArgs {
    pub test_file: String,
    pub test_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensPosition {
    pub line: u32,
    pub character: u32,
}

/// Zero-based, LSP-shaped range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensRange {
    pub start: LensPosition,
    pub end: LensPosition,
}

impl LensRange {
    /// Anchor covering the start of `line`.
    pub fn line_anchor(line: usize) -> Self {
        let line = u32::try_from(line).unwrap_or(u32::MAX);
        Self {
            start: LensPosition { line, character: 0 },
            end: LensPosition {
                line,
                character: LENS_COLUMN_SPAN,
            },
        }
    }
}

/// A single lens: where it sits, what it says, and what it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub range: LensRange,
    pub label: String,
    pub action: ActionKind,
    pub args: ActionArgs,
}

impl Annotation {
    pub fn new(line: usize, action: ActionKind, args: ActionArgs) -> Self {
        Self {
            range: LensRange::line_anchor(line),
            label: action.label().to_string(),
            action,
            args,
        }
    }

    pub fn line(&self) -> u32 {
        self.range.start.line
    }
}
