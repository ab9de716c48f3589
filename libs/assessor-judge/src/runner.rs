/// Case Runner - high-level orchestration
///
/// **Responsibility:**
/// Drive a question's cases through the cached executor and evaluate them.
///
/// **Architecture:**
/// 1. Look up (source, input) in the result cache; a hit short-circuits
/// 2. On a miss, execute through the primary/fallback strategy and store
/// 3. Evaluate the result against the expected output (evaluator.rs)
/// 4. Aggregate outcomes into a score
///
/// Cases run strictly one after another to keep load on the judge backend
/// bounded; total time grows linearly with the case count.

use crate::cache::{CacheKey, ResultCache};
use crate::evaluator;
use crate::executor::{Executor, FallbackExecutor};
use crate::metrics;
use crate::simulator::Simulator;
use assessor_common::error::JudgeError;
use assessor_common::types::{
    CaseOutcome, ExecutionRequest, ExecutionResult, Mode, Question, RunResponse, ScoreResult,
    SubmitResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Safety limits to keep pathological payloads away from the backend
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
pub const MAX_TEST_INPUT_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Outcomes of one judged case set plus its score
#[derive(Debug, Clone)]
pub struct Judgement {
    pub outcomes: Vec<CaseOutcome>,
    pub score: ScoreResult,
}

pub struct CaseRunner {
    cache: Arc<ResultCache>,
    executor: Arc<dyn Executor>,
}

impl CaseRunner {
    pub fn new(cache: Arc<ResultCache>, executor: Arc<dyn Executor>) -> Self {
        Self { cache, executor }
    }

    /// Primary executor backed by the pattern simulator
    pub fn with_fallback(cache: Arc<ResultCache>, primary: Arc<dyn Executor>) -> Self {
        let executor = FallbackExecutor::new(primary, Arc::new(Simulator::new()));
        Self::new(cache, Arc::new(executor))
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    fn check_limits(source: &str, input: &str) -> Result<(), JudgeError> {
        if source.len() > MAX_SOURCE_CODE_BYTES {
            return Err(JudgeError::InvalidQuestion(format!(
                "source code exceeds maximum size of {} bytes",
                MAX_SOURCE_CODE_BYTES
            )));
        }
        if input.len() > MAX_TEST_INPUT_BYTES {
            return Err(JudgeError::InvalidQuestion(format!(
                "test input exceeds maximum size of {} bytes",
                MAX_TEST_INPUT_BYTES
            )));
        }
        Ok(())
    }

    /// Execute one request, consulting the cache first
    pub async fn execute_cached(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let key = CacheKey::for_request(request);

        if let Some(hit) = self.cache.get(&key).await {
            metrics::CACHE_HITS.inc();
            debug!(cache = "hit", key = key.as_str(), "Reusing cached result");
            return Ok(hit);
        }

        metrics::CACHE_MISSES.inc();
        debug!(cache = "miss", key = key.as_str(), executor = self.executor.name(), "Executing");

        let result = self.executor.execute(request).await?;
        metrics::CASE_EXECUTION_MS.observe(result.execution_time_ms as f64);
        self.cache.put(key, result.clone()).await;
        Ok(result)
    }

    /// Ad-hoc run of the source against custom input
    #[instrument(skip(self, source, input), fields(source_size = source.len()))]
    pub async fn run_custom(&self, source: &str, input: &str) -> Result<ExecutionResult, JudgeError> {
        Self::check_limits(source, input)?;
        self.execute_cached(&ExecutionRequest::new(source, input)).await
    }

    /// Judge the cases selected by `mode` in submission order
    #[instrument(skip(self, question, source), fields(question_id = %question.id, mode = ?mode))]
    pub async fn judge(&self, question: &Question, source: &str, mode: Mode) -> Result<Judgement, JudgeError> {
        let cases = question.cases(mode);
        if cases.is_empty() {
            return Err(JudgeError::InvalidQuestion(format!(
                "question '{}' has no test cases for {:?} mode",
                question.id, mode
            )));
        }
        for case in &cases {
            Self::check_limits(source, &case.input)?;
        }

        let mut outcomes = Vec::with_capacity(cases.len());
        for (idx, case) in cases.iter().enumerate() {
            let request = ExecutionRequest::new(source, case.input.as_str());
            let result = self.execute_cached(&request).await?;
            let outcome = evaluator::evaluate_case(case, &result);

            debug!(
                case = idx + 1,
                hidden = case.is_hidden,
                passed = outcome.passed,
                execution_ms = outcome.execution_time_ms,
                "Case judged"
            );
            outcomes.push(outcome);
        }

        let score = evaluator::score(&outcomes, question.points)?;
        info!(
            passed = score.passed_count,
            total = score.total_cases,
            score = score.score,
            max_score = score.max_score,
            "Judging complete"
        );

        Ok(Judgement { outcomes, score })
    }

    /// Example cases only; reports whether all passed
    pub async fn run_examples(&self, question: &Question, source: &str) -> Result<RunResponse, JudgeError> {
        let judgement = self.judge(question, source, Mode::Run).await?;
        let all_passed = judgement.score.passed_count == judgement.score.total_cases;
        let message = if all_passed {
            "All test cases passed!".to_string()
        } else {
            format!(
                "{}/{} test cases passed",
                judgement.score.passed_count, judgement.score.total_cases
            )
        };

        Ok(RunResponse {
            success: true,
            results: judgement.outcomes,
            all_passed,
            message,
        })
    }

    /// Examples and hidden cases; reports the partial-credit score
    pub async fn submit(&self, question: &Question, source: &str) -> Result<SubmitResponse, JudgeError> {
        let judgement = self.judge(question, source, Mode::Submit).await?;
        let score = judgement.score;

        Ok(SubmitResponse {
            success: true,
            results: judgement.outcomes,
            passed_count: score.passed_count,
            total_test_cases: score.total_cases,
            score: score.score,
            max_score: score.max_score,
            message: format!(
                "Passed {} out of {} test cases",
                score.passed_count, score.total_cases
            ),
        })
    }
}
