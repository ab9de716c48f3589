use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_code))
        .route("/submit", post(handlers::submit_code))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
}
