use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::error;

use crate::{
    app::AppState,
    pipeline::{self, PipelineSettings},
};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `GET /generate`: runs the full generate-train-predict-render pipeline
/// and returns the detection report. The pipeline is CPU-bound, so it
/// runs on the blocking pool; each invocation is fully isolated and
/// retrains from scratch.
pub(crate) async fn generate(State(state): State<AppState>) -> impl IntoResponse {
    state.telemetry().metrics().generate_requests.inc();

    let settings = PipelineSettings::from(state.config().as_ref());
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || pipeline::run(&settings)).await;
    state
        .telemetry()
        .metrics()
        .pipeline_duration
        .observe(started.elapsed().as_secs_f64());

    let report = match result {
        Ok(Ok(report)) => report,
        Ok(Err(error)) => {
            state.telemetry().metrics().generate_failures.inc();
            error!(error = ?error, "detection pipeline failed");
            let body = Json(ErrorResponse {
                error: format!("{error:#}"),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }
        Err(join_error) => {
            state.telemetry().metrics().generate_failures.inc();
            error!(error = ?join_error, "detection pipeline task aborted");
            let body = Json(ErrorResponse {
                error: "pipeline task aborted".to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }
    };

    (StatusCode::OK, Json(report)).into_response()
}
