/// Outcome Classifier - judge backend status → ExecutionResult
///
/// Pure and total: every status id resolves to exactly one row.
///
/// | status id           | success | error                    |
/// |---------------------|---------|--------------------------|
/// | 6 Compilation Error | false   | "Compilation Error: ..." |
/// | 5 Time Limit        | false   | "Time Limit Exceeded"    |
/// | 3 Accepted          | true    | none                     |
/// | >= 7 (runtime)      | false   | "Runtime Error: ..."     |
/// | anything else       | true    | none                     |
///
/// The last row covers Wrong Answer (4) and a poll budget that ran out while
/// still queued (1, 2). It keeps the historical default-success behaviour and
/// is logged so it can be reviewed.

use assessor_common::types::ExecutionResult;
use tracing::warn;

pub const STATUS_IN_QUEUE: u32 = 1;
pub const STATUS_PROCESSING: u32 = 2;
pub const STATUS_ACCEPTED: u32 = 3;
pub const STATUS_WRONG_ANSWER: u32 = 4;
pub const STATUS_TIME_LIMIT_EXCEEDED: u32 = 5;
pub const STATUS_COMPILATION_ERROR: u32 = 6;
/// First of the runtime failure ids (SIGSEGV, SIGXFSZ, SIGFPE, SIGABRT, NZEC,
/// Other, Internal Error, Exec Format Error)
pub const RUNTIME_ERROR_THRESHOLD: u32 = 7;

/// Decoded terminal (or last observed) state of a remote job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutcome {
    pub status_id: u32,
    pub description: String,
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub message: String,
    pub time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Accepted,
    CompilationError,
    TimeLimitExceeded,
    RuntimeError,
    Unmapped,
}

/// Still queued or running on the backend
pub fn is_pending(status_id: u32) -> bool {
    status_id == STATUS_IN_QUEUE || status_id == STATUS_PROCESSING
}

pub fn class_of(status_id: u32) -> OutcomeClass {
    match status_id {
        STATUS_ACCEPTED => OutcomeClass::Accepted,
        STATUS_TIME_LIMIT_EXCEEDED => OutcomeClass::TimeLimitExceeded,
        STATUS_COMPILATION_ERROR => OutcomeClass::CompilationError,
        id if id >= RUNTIME_ERROR_THRESHOLD => OutcomeClass::RuntimeError,
        _ => OutcomeClass::Unmapped,
    }
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().map(|s| s.trim()).find(|s| !s.is_empty())
}

pub fn classify(outcome: &RemoteOutcome) -> ExecutionResult {
    let output = outcome.stdout.trim().to_string();
    let time_ms = outcome.time_ms;

    match class_of(outcome.status_id) {
        OutcomeClass::Accepted => ExecutionResult::accepted(output, time_ms),
        OutcomeClass::CompilationError => {
            let detail = first_non_empty(&[&outcome.compile_output, &outcome.message])
                .unwrap_or("compilation failed");
            ExecutionResult::failed(output, format!("Compilation Error: {}", detail), time_ms)
        }
        OutcomeClass::TimeLimitExceeded => {
            ExecutionResult::failed(output, "Time Limit Exceeded", time_ms)
        }
        OutcomeClass::RuntimeError => {
            let detail = first_non_empty(&[&outcome.stderr, &outcome.message, &outcome.description])
                .unwrap_or("execution failed");
            ExecutionResult::failed(output, format!("Runtime Error: {}", detail), time_ms)
        }
        OutcomeClass::Unmapped => {
            warn!(
                status_id = outcome.status_id,
                description = %outcome.description,
                "Unmapped judge status treated as accepted"
            );
            ExecutionResult::accepted(output, time_ms)
        }
    }
}
