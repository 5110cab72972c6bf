//! AI interviewer proxies: question generation, answer analysis, and
//! candidate profile synthesis. Plain JSON passthrough with per-operation
//! audit summaries; upstream failures surface verbatim.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::{self, AuditRecord};
use crate::errors::AppError;
use crate::state::AppState;

pub const QUESTIONS_PATH: &str = "/ai_interviewer/generate_questions";
pub const RESPONSE_PATH: &str = "/ai_interviewer/analyze_response";
pub const PROFILE_PATH: &str = "/ai_interviewer/generate_profile";

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub job_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_questions: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponseRequest {
    pub question: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateProfileRequest {
    pub responses: Vec<Value>,
}

/// POST /ai_interviewer/generate_questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<Value>, AppError> {
    let body = serde_json::to_value(&request).map_err(anyhow::Error::from)?;
    let payload = state.upstream.post_json(QUESTIONS_PATH, &body).await?;

    audit::spawn_record(
        &state.audit,
        AuditRecord::QuestionGen {
            job_description: request.job_description,
            interview_type: request.interview_type,
            num_questions: request.num_questions,
            total_questions: payload.get("total_questions").and_then(Value::as_i64),
        },
    );
    Ok(Json(payload))
}

/// POST /ai_interviewer/analyze_response
pub async fn handle_analyze_response(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeResponseRequest>,
) -> Result<Json<Value>, AppError> {
    let body = serde_json::to_value(&request).map_err(anyhow::Error::from)?;
    let payload = state.upstream.post_json(RESPONSE_PATH, &body).await?;

    audit::spawn_record(
        &state.audit,
        AuditRecord::ResponseAnalysis {
            question: request.question,
            response: request.response,
            question_type: request.question_type,
        },
    );
    Ok(Json(payload))
}

/// POST /ai_interviewer/generate_profile
pub async fn handle_generate_profile(
    State(state): State<AppState>,
    Json(request): Json<GenerateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let body = serde_json::to_value(&request).map_err(anyhow::Error::from)?;
    let payload = state.upstream.post_json(PROFILE_PATH, &body).await?;

    audit::spawn_record(
        &state.audit,
        AuditRecord::ProfileGen {
            responses_count: request.responses.len() as i64,
            summary: payload
                .get("profile")
                .and_then(Value::as_str)
                .map(String::from),
        },
    );
    Ok(Json(payload))
}
