use crate::error::JudgeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source languages the judge backend is configured for.
/// Only C++ is wired up; other selectors are rejected before judging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
}

impl Language {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cpp" | "c++" | "cplusplus" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Validate a caller-supplied selector before anything reaches the judge
    pub fn parse(selector: &str) -> Result<Self, JudgeError> {
        Self::from_str(selector).ok_or_else(|| JudgeError::UnsupportedLanguage(selector.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cpp => write!(f, "cpp"),
        }
    }
}

/// Judging mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Example cases only, no score
    Run,
    /// Example and hidden cases, scored
    Submit,
}

/// One unit of work for an executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            stdin: stdin.into(),
        }
    }
}

/// Result of executing one request, either on the judge backend or in the
/// local simulator. Compilation errors, runtime errors and timeouts are
/// carried here as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    pub fn accepted(output: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            execution_time_ms,
        }
    }

    pub fn failed(output: impl Into<String>, error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}

/// A visible example case on a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleCase {
    pub input: String,
    pub output: String,
}

/// A held-out case, revealed only after final submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenCase {
    pub input: String,
    pub output: String,
}

/// Coding question as handed over by the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub examples: Vec<ExampleCase>,
    #[serde(default)]
    pub hidden: Vec<HiddenCase>,
    pub points: u32,
}

/// A case normalized for the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    pub is_hidden: bool,
}

impl Question {
    /// Cases to execute for the given mode, in submission order
    pub fn cases(&self, mode: Mode) -> Vec<TestCase> {
        let examples = self.examples.iter().map(|c| TestCase {
            input: c.input.clone(),
            expected_output: c.output.clone(),
            is_hidden: false,
        });

        match mode {
            Mode::Run => examples.collect(),
            Mode::Submit => examples
                .chain(self.hidden.iter().map(|c| TestCase {
                    input: c.input.clone(),
                    expected_output: c.output.clone(),
                    is_hidden: true,
                }))
                .collect(),
        }
    }
}

/// Per-case judging outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub is_hidden: bool,
}

/// Partial-credit score over a case set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub passed_count: usize,
    pub total_cases: usize,
    pub score: u32,
    pub max_score: u32,
}

/// Response for an ad-hoc run with custom input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdHocRunResponse {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl From<ExecutionResult> for AdHocRunResponse {
    fn from(result: ExecutionResult) -> Self {
        Self {
            success: result.success,
            output: result.output,
            error: result.error,
            execution_time_ms: result.execution_time_ms,
        }
    }
}

/// Response for a run over the example cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub success: bool,
    pub results: Vec<CaseOutcome>,
    pub all_passed: bool,
    pub message: String,
}

/// Response for a final submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub results: Vec<CaseOutcome>,
    pub passed_count: usize,
    pub total_test_cases: usize,
    pub score: u32,
    pub max_score: u32,
    pub message: String,
}
