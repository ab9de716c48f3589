/// Judge Client - remote execution on a Judge0-compatible backend
///
/// **Sequencing contract:**
/// 1. Submit source + stdin, receive an opaque token
/// 2. Poll the token every `poll_interval` up to `max_poll_attempts` times;
///    In Queue / Processing are non-terminal, everything else is terminal
/// 3. Decode the base64 payloads and hand them to the classifier
///
/// **Failure semantics:**
/// - 429, 403, quota messages, other non-2xx, transport errors and bodies that
///   do not decode all raise `RemoteUnavailable`; nothing is retried here
/// - An exhausted poll budget classifies the last status observed
///
/// The wire format (endpoints, query flags, field names, status ids) is the
/// backend's contract and must not drift.

use crate::classifier::{self, RemoteOutcome, STATUS_IN_QUEUE};
use crate::executor::Executor;
use crate::metrics;
use assessor_common::config::JudgeConfig;
use assessor_common::error::{JudgeError, UnavailableReason};
use assessor_common::types::{ExecutionRequest, ExecutionResult};
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const STATUS_FIELDS: &str = "stdout,stderr,status_id,status,compile_output,message,time";

#[derive(Debug, Serialize)]
struct SubmissionBody {
    source_code: String,
    language_id: u32,
    stdin: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct StatusField {
    id: u32,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionStatus {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    message: Option<String>,
    status: Option<StatusField>,
    status_id: Option<u32>,
    time: Option<String>,
}

pub struct JudgeClient {
    http: Client,
    config: JudgeConfig,
}

impl JudgeClient {
    pub fn new(config: JudgeConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client for judge backend")?;
        Ok(Self { http, config })
    }

    fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    fn with_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(key) = &self.config.api_key {
            builder = builder.header("X-RapidAPI-Key", key);
            if let Some(host) = &self.config.api_host {
                builder = builder.header("X-RapidAPI-Host", host);
            }
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, JudgeError> {
        let response = self
            .with_headers(builder)
            .send()
            .await
            .map_err(|e| unavailable(UnavailableReason::Transport(e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let reason = match status {
            StatusCode::TOO_MANY_REQUESTS if body.to_lowercase().contains("quota") => {
                UnavailableReason::QuotaExceeded
            }
            StatusCode::TOO_MANY_REQUESTS => UnavailableReason::RateLimited,
            StatusCode::FORBIDDEN => UnavailableReason::QuotaExceeded,
            _ if body.to_lowercase().contains("quota") => UnavailableReason::QuotaExceeded,
            other => UnavailableReason::UnexpectedStatus(other.as_u16()),
        };
        Err(unavailable(reason))
    }

    async fn submit(&self, request: &ExecutionRequest) -> Result<String, JudgeError> {
        let url = format!("{}/submissions?base64_encoded=true&wait=false", self.base_url());
        let body = SubmissionBody {
            source_code: general_purpose::STANDARD.encode(&request.source_code),
            language_id: self.config.language_id,
            stdin: general_purpose::STANDARD.encode(&request.stdin),
        };

        let response = self.send(self.http.post(&url).json(&body)).await?;
        let token: SubmissionToken = response
            .json()
            .await
            .map_err(|e| unavailable(UnavailableReason::MalformedResponse(e.to_string())))?;
        Ok(token.token)
    }

    async fn fetch_status(&self, token: &str) -> Result<SubmissionStatus, JudgeError> {
        let url = format!(
            "{}/submissions/{}?base64_encoded=true&fields={}",
            self.base_url(),
            token,
            STATUS_FIELDS
        );
        metrics::REMOTE_POLLS.inc();
        let response = self.send(self.http.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|e| unavailable(UnavailableReason::MalformedResponse(e.to_string())))
    }

    /// Submit, poll until terminal or out of attempts, classify
    #[instrument(skip(self, request), fields(source_size = request.source_code.len(), input_size = request.stdin.len()))]
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        let started = Instant::now();
        let token = self.submit(request).await?;
        debug!(token = %token, "Submission accepted by judge backend");

        let mut last_seen: Option<RemoteOutcome> = None;

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval()).await;

            let status = self.fetch_status(&token).await?;
            let outcome = decode_status(status, started)?;

            if !classifier::is_pending(outcome.status_id) {
                info!(
                    token = %token,
                    attempt,
                    status_id = outcome.status_id,
                    status = %outcome.description,
                    time_ms = outcome.time_ms,
                    "Judge returned terminal status"
                );
                return Ok(classifier::classify(&outcome));
            }

            debug!(token = %token, attempt, status_id = outcome.status_id, "Job still pending");
            last_seen = Some(outcome);
        }

        warn!(
            token = %token,
            attempts = self.config.max_poll_attempts,
            "Poll budget exhausted, classifying last observed status"
        );
        let outcome = last_seen.unwrap_or_else(|| RemoteOutcome {
            status_id: STATUS_IN_QUEUE,
            description: "In Queue".to_string(),
            time_ms: started.elapsed().as_millis() as u64,
            ..Default::default()
        });
        Ok(classifier::classify(&outcome))
    }
}

#[async_trait]
impl Executor for JudgeClient {
    fn name(&self) -> &'static str {
        "judge0"
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, JudgeError> {
        self.run(request).await
    }
}

fn unavailable(reason: UnavailableReason) -> JudgeError {
    JudgeError::RemoteUnavailable(reason)
}

/// Base64 payloads may carry line breaks every 60 characters
fn decode_field(value: Option<String>) -> Result<String, JudgeError> {
    let Some(encoded) = value else {
        return Ok(String::new());
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| unavailable(UnavailableReason::MalformedResponse(e.to_string())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_status(status: SubmissionStatus, started: Instant) -> Result<RemoteOutcome, JudgeError> {
    let (status_id, description) = match (status.status, status.status_id) {
        (Some(field), _) => (field.id, field.description),
        (None, Some(id)) => (id, String::new()),
        (None, None) => {
            return Err(unavailable(UnavailableReason::MalformedResponse(
                "status missing from response".to_string(),
            )))
        }
    };

    let time_ms = status
        .time
        .as_deref()
        .and_then(|t| t.trim().parse::<f64>().ok())
        .map(|secs| (secs * 1000.0).round() as u64)
        .unwrap_or_else(|| started.elapsed().as_millis() as u64);

    Ok(RemoteOutcome {
        status_id,
        description,
        stdout: decode_field(status.stdout)?,
        stderr: decode_field(status.stderr)?,
        compile_output: decode_field(status.compile_output)?,
        message: decode_field(status.message)?,
        time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode, status_body, MockJudge};
    use axum::http::StatusCode as MockStatus;
    use serde_json::json;

    fn config_for(mock: &MockJudge) -> JudgeConfig {
        JudgeConfig {
            api_url: mock.url(),
            api_key: Some("test-key".to_string()),
            poll_interval_ms: 5,
            max_poll_attempts: 4,
            request_timeout_ms: 2000,
            ..JudgeConfig::default()
        }
    }

    fn request() -> ExecutionRequest {
        ExecutionRequest::new("#include <iostream>\nint main(){}", "5\n")
    }

    #[test]
    fn test_decode_field_handles_line_breaks() {
        let encoded = encode("hello world, this is a long enough line to be wrapped");
        let wrapped = format!("{}\n{}", &encoded[..20], &encoded[20..]);
        assert_eq!(
            decode_field(Some(wrapped)).unwrap(),
            "hello world, this is a long enough line to be wrapped"
        );
        assert_eq!(decode_field(None).unwrap(), "");
        assert!(decode_field(Some("%%%".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_submit_encodes_payload_and_headers() {
        let mock = MockJudge::start(vec![status_body(3, "Accepted", "10", "", "")]).await;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        client.run(&request()).await.unwrap();

        let state = mock.state.lock().unwrap();
        let submission = &state.submissions[0];
        assert_eq!(submission["language_id"], json!(54));
        assert_eq!(submission["source_code"], json!(encode("#include <iostream>\nint main(){}")));
        assert_eq!(submission["stdin"], json!(encode("5\n")));
        assert_eq!(state.submit_query.get("base64_encoded").map(String::as_str), Some("true"));
        assert_eq!(state.submit_query.get("wait").map(String::as_str), Some("false"));
        assert_eq!(state.api_keys, vec!["test-key".to_string()]);
    }

    #[tokio::test]
    async fn test_polls_until_terminal() {
        let mock = MockJudge::start(vec![
            status_body(1, "In Queue", "", "", ""),
            status_body(2, "Processing", "", "", ""),
            status_body(3, "Accepted", "10\n", "", ""),
        ])
        .await;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let result = client.run(&request()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "10");
        assert_eq!(result.execution_time_ms, 4);
        assert_eq!(mock.state.lock().unwrap().polls, 3);
    }

    #[tokio::test]
    async fn test_poll_budget_exhausted_uses_last_status() {
        let mock = MockJudge::start(vec![status_body(2, "Processing", "", "", "")]).await;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let result = client.run(&request()).await.unwrap();

        // Processing is unmapped and therefore default-success
        assert!(result.success);
        assert_eq!(result.output, "");
        assert_eq!(mock.state.lock().unwrap().polls, 4);
    }

    #[tokio::test]
    async fn test_compilation_error_is_classified() {
        let mock = MockJudge::start(vec![status_body(
            6,
            "Compilation Error",
            "",
            "",
            "main.cpp:1: error: 'x' was not declared",
        )])
        .await;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let result = client.run(&request()).await.unwrap();

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Compilation Error: main.cpp:1: error: 'x' was not declared")
        );
    }

    #[tokio::test]
    async fn test_rate_limit_raises_unavailable() {
        let mock = MockJudge::start(vec![]).await;
        mock.state.lock().unwrap().submit_status = MockStatus::TOO_MANY_REQUESTS;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let err = client.run(&request()).await.unwrap_err();

        assert_eq!(err, JudgeError::RemoteUnavailable(UnavailableReason::RateLimited));
    }

    #[tokio::test]
    async fn test_quota_raises_unavailable() {
        let mock = MockJudge::start(vec![]).await;
        mock.state.lock().unwrap().submit_status = MockStatus::FORBIDDEN;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let err = client.run(&request()).await.unwrap_err();

        assert_eq!(err, JudgeError::RemoteUnavailable(UnavailableReason::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_server_error_while_polling_raises_unavailable() {
        let mock = MockJudge::start(vec![]).await;
        mock.state.lock().unwrap().poll_status = MockStatus::BAD_GATEWAY;
        let client = JudgeClient::new(config_for(&mock)).unwrap();

        let err = client.run(&request()).await.unwrap_err();

        assert_eq!(err, JudgeError::RemoteUnavailable(UnavailableReason::UnexpectedStatus(502)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_raises_transport() {
        let config = JudgeConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            request_timeout_ms: 500,
            ..JudgeConfig::default()
        };
        let client = JudgeClient::new(config).unwrap();

        let err = client.run(&request()).await.unwrap_err();

        assert!(matches!(
            err,
            JudgeError::RemoteUnavailable(UnavailableReason::Transport(_))
        ));
    }
}
