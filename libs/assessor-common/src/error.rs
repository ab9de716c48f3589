use thiserror::Error;

/// Why the judge backend could not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    RateLimited,
    QuotaExceeded,
    Transport(String),
    UnexpectedStatus(u16),
    MalformedResponse(String),
}

impl UnavailableReason {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            UnavailableReason::RateLimited => "rate_limited",
            UnavailableReason::QuotaExceeded => "quota_exceeded",
            UnavailableReason::Transport(_) => "transport",
            UnavailableReason::UnexpectedStatus(_) => "unexpected_status",
            UnavailableReason::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::RateLimited => write!(f, "rate limited"),
            UnavailableReason::QuotaExceeded => write!(f, "quota exceeded"),
            UnavailableReason::Transport(e) => write!(f, "transport error: {}", e),
            UnavailableReason::UnexpectedStatus(code) => write!(f, "unexpected HTTP status {}", code),
            UnavailableReason::MalformedResponse(e) => write!(f, "malformed response: {}", e),
        }
    }
}

/// Faults of the judging pipeline.
///
/// Compilation errors, runtime errors and timeouts are not faults; they are
/// reported inside `ExecutionResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    /// Backend unreachable, rate limited or over quota. Never leaves the
    /// pipeline: the fallback executor recovers it.
    #[error("Judge backend unavailable: {0}")]
    RemoteUnavailable(UnavailableReason),
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("Question not found: {0}")]
    QuestionNotFound(String),
}

impl JudgeError {
    /// Whether the error belongs to the caller rather than to the pipeline
    pub fn is_client_error(&self) -> bool {
        !matches!(self, JudgeError::RemoteUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = JudgeError::RemoteUnavailable(UnavailableReason::UnexpectedStatus(502));
        assert_eq!(err.to_string(), "Judge backend unavailable: unexpected HTTP status 502");
        assert!(!err.is_client_error());

        let err = JudgeError::UnsupportedLanguage("python".to_string());
        assert_eq!(err.to_string(), "Unsupported language: python");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(UnavailableReason::RateLimited.label(), "rate_limited");
        assert_eq!(UnavailableReason::Transport("reset".into()).label(), "transport");
    }
}
