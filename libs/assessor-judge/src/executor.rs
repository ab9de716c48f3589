/// Executors - primary/fallback execution strategy
///
/// **Architecture:**
/// - `Executor` is the single contract: request in, `ExecutionResult` out
/// - The judge backend client is the primary executor
/// - The pattern simulator is the fallback executor
/// - `FallbackExecutor` tries the primary and asks `route_failure` what to do
///   with its error
///
/// Callers above this layer never see `RemoteUnavailable`.

use crate::metrics;
use assessor_common::error::JudgeError;
use assessor_common::types::{ExecutionRequest, ExecutionResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError>;
}

/// What to do with a primary executor failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Fallback,
    Propagate,
}

pub fn route_failure(error: &JudgeError) -> Route {
    match error {
        JudgeError::RemoteUnavailable(_) => Route::Fallback,
        JudgeError::InvalidQuestion(_)
        | JudgeError::UnsupportedLanguage(_)
        | JudgeError::QuestionNotFound(_) => Route::Propagate,
    }
}

pub struct FallbackExecutor {
    primary: Arc<dyn Executor>,
    fallback: Arc<dyn Executor>,
}

impl FallbackExecutor {
    pub fn new(primary: Arc<dyn Executor>, fallback: Arc<dyn Executor>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Executor for FallbackExecutor {
    fn name(&self) -> &'static str {
        "fallback-strategy"
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let error = match self.primary.execute(request).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        match route_failure(&error) {
            Route::Fallback => {
                if let JudgeError::RemoteUnavailable(reason) = &error {
                    metrics::FALLBACKS.with_label_values(&[reason.label()]).inc();
                }
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %error,
                    "Primary executor unavailable, using fallback"
                );
                self.fallback.execute(request).await
            }
            Route::Propagate => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assessor_common::error::UnavailableReason;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        reply: Result<ExecutionResult, JudgeError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, reply: Result<ExecutionResult, JudgeError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Executor for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, _request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn request() -> ExecutionRequest {
        ExecutionRequest::new("int main() {}", "")
    }

    #[test]
    fn test_route_failure() {
        assert_eq!(
            route_failure(&JudgeError::RemoteUnavailable(UnavailableReason::RateLimited)),
            Route::Fallback
        );
        assert_eq!(
            route_failure(&JudgeError::InvalidQuestion("empty".into())),
            Route::Propagate
        );
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Scripted::new("primary", Ok(ExecutionResult::accepted("remote", 3)));
        let fallback = Scripted::new("fallback", Ok(ExecutionResult::accepted("local", 90)));
        let executor = FallbackExecutor::new(primary.clone(), fallback.clone());

        let result = executor.execute(&request()).await.unwrap();

        assert_eq!(result.output, "remote");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_unavailable_routes_to_fallback() {
        for reason in [
            UnavailableReason::RateLimited,
            UnavailableReason::QuotaExceeded,
            UnavailableReason::Transport("connection refused".into()),
        ] {
            let primary = Scripted::new("primary", Err(JudgeError::RemoteUnavailable(reason)));
            let fallback = Scripted::new("fallback", Ok(ExecutionResult::accepted("local", 90)));
            let executor = FallbackExecutor::new(primary.clone(), fallback.clone());

            let result = executor.execute(&request()).await.unwrap();

            assert_eq!(result.output, "local");
            assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
            assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let primary = Scripted::new("primary", Err(JudgeError::InvalidQuestion("bad".into())));
        let fallback = Scripted::new("fallback", Ok(ExecutionResult::accepted("local", 90)));
        let executor = FallbackExecutor::new(primary, fallback.clone());

        let err = executor.execute(&request()).await.unwrap_err();

        assert_eq!(err, JudgeError::InvalidQuestion("bad".into()));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }
}
