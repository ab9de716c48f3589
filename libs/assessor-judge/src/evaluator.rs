/// Case Evaluator - output comparison and partial-credit scoring
///
/// **Core Responsibility:**
/// Compare execution outputs against expected outputs and turn pass counts
/// into a score.
///
/// **Critical Properties:**
/// - Knows nothing about the judge backend, the simulator or the cache
/// - Pure functions: (results, expected outputs) → outcomes → score
///
/// **Normalization Rules (both sides):**
/// - Trim leading and trailing whitespace
/// - Strip one layer of matching surrounding quotes (`"..."` or `'...'`),
///   since some judges quote string outputs
/// - Repeat until nothing changes, so normalizing twice is a no-op
/// - Case sensitive, internal whitespace preserved
///
/// **Scoring Rules:**
/// - score = round(passed / total * max_score)
/// - A run that is not fully passed never reaches max_score
/// - A case set must not be empty

use assessor_common::error::JudgeError;
use assessor_common::types::{CaseOutcome, ExecutionResult, ScoreResult, TestCase};

fn strip_quote_layer(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    if first == last && (first == b'"' || first == b'\'') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Normalize an output string for comparison
pub fn normalize_output(output: &str) -> &str {
    let mut current = output.trim();
    while let Some(inner) = strip_quote_layer(current) {
        current = inner.trim();
    }
    current
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Judge one case against its execution result
pub fn evaluate_case(case: &TestCase, result: &ExecutionResult) -> CaseOutcome {
    let passed = result.success && outputs_match(&result.output, &case.expected_output);

    CaseOutcome {
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output: result.output.clone(),
        passed,
        execution_time_ms: result.execution_time_ms,
        error: result.error.clone(),
        is_hidden: case.is_hidden,
    }
}

/// Aggregate pass counts into a partial-credit score
pub fn score(outcomes: &[CaseOutcome], max_score: u32) -> Result<ScoreResult, JudgeError> {
    let total_cases = outcomes.len();
    if total_cases == 0 {
        return Err(JudgeError::InvalidQuestion(
            "question has no test cases".to_string(),
        ));
    }

    let passed_count = outcomes.iter().filter(|o| o.passed).count();
    let raw = (passed_count as f64 / total_cases as f64 * max_score as f64).round() as u32;

    let score = if passed_count == total_cases {
        max_score
    } else {
        // Rounding up to full marks would hide a failed case
        raw.min(max_score.saturating_sub(1))
    };

    Ok(ScoreResult {
        passed_count,
        total_cases,
        score,
        max_score,
    })
}
