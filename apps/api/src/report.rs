//! Career report proxies: full report from an uploaded resume, and the
//! aggregate endpoint that merges previously computed sections. Straight
//! passthrough; upstream failures surface verbatim.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::Value;

use crate::errors::AppError;
use crate::resume::read_upload;
use crate::state::AppState;

pub const CREATE_REPORT_PATH: &str = "/create_report";
pub const AGGREGATE_PATH: &str = "/create_report/aggregate";

/// POST /create_report
pub async fn handle_create_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart).await?;
    let payload = state
        .upstream
        .post_multipart(CREATE_REPORT_PATH, upload.file, &[])
        .await?;
    Ok(Json(payload))
}

/// POST /create_report/aggregate
pub async fn handle_aggregate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let payload = state.upstream.post_json(AGGREGATE_PATH, &body).await?;
    Ok(Json(payload))
}
