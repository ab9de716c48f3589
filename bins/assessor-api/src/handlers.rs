// HTTP route handlers for the Assessor API

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use assessor_common::error::JudgeError;
use assessor_common::types::{AdHocRunResponse, Language, Question};
use assessor_judge::metrics;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default, alias = "question_id")]
    pub question_id: Option<String>,
    pub language: String,
    #[serde(alias = "source_code")]
    pub source_code: String,
    /// Custom stdin; when present the run is ad hoc and ignores the question
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(alias = "question_id")]
    pub question_id: String,
    pub language: String,
    #[serde(alias = "source_code")]
    pub source_code: String,
}

/// JudgeError rendered as a JSON client/server error
pub struct ApiError(JudgeError);

impl From<JudgeError> for ApiError {
    fn from(err: JudgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            JudgeError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
            JudgeError::InvalidQuestion(_) | JudgeError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            }
            JudgeError::RemoteUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "Judging failed");
        } else {
            warn!(error = %self.0, "Rejected judging request");
        }

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

fn find_question(state: &AppState, question_id: &str) -> Result<Question, JudgeError> {
    state
        .questions
        .question(question_id)
        .ok_or_else(|| JudgeError::QuestionNotFound(question_id.to_string()))
}

/// POST /run - Ad-hoc run with custom input, or a run over the example cases
#[instrument(skip(state, payload), fields(request_id = %Uuid::new_v4(), question_id = ?payload.question_id))]
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> Result<Response, ApiError> {
    Language::parse(&payload.language)?;

    if let Some(input) = payload.input.as_deref() {
        let result = state.runner.run_custom(&payload.source_code, input).await?;
        info!(success = result.success, execution_ms = result.execution_time_ms, "Custom run finished");
        return Ok(Json(AdHocRunResponse::from(result)).into_response());
    }

    let question_id = payload.question_id.as_deref().ok_or_else(|| {
        JudgeError::InvalidQuestion("either questionId or input is required".to_string())
    })?;
    let question = find_question(&state, question_id)?;

    let response = state.runner.run_examples(&question, &payload.source_code).await?;
    info!(all_passed = response.all_passed, cases = response.results.len(), "Example run finished");
    Ok(Json(response).into_response())
}

/// POST /submit - Final submission over examples and hidden cases
#[instrument(skip(state, payload), fields(request_id = %Uuid::new_v4(), question_id = %payload.question_id))]
pub async fn submit_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    Language::parse(&payload.language)?;
    let question = find_question(&state, &payload.question_id)?;

    let response = state.runner.submit(&question, &payload.source_code).await?;
    info!(
        score = response.score,
        max_score = response.max_score,
        passed = response.passed_count,
        total = response.total_test_cases,
        "Submission judged"
    );
    Ok(Json(response).into_response())
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather(),
    )
}
