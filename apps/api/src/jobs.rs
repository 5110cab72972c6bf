//! Job matching: the cascaded search proxy and CV analysis.
//!
//! Search is the one operation that never surfaces a transport error: cache
//! lookup first, then the degradation cascade, then (for a stage success,
//! not the synthesized fallback) a cache write so a flapping backend is not
//! masked for five minutes by an empty result set.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::audit::{self, AuditRecord};
use crate::errors::AppError;
use crate::proxy::cascade::{
    original_params, run_search_cascade, CascadeResolution, SearchParams,
};
use crate::proxy::params::cache_key;
use crate::state::AppState;

pub const ANALYZE_CV_PATH: &str = "/job_matcher/analyze_cv";

#[derive(Debug, Deserialize)]
pub struct AnalyzeCvRequest {
    pub resume_text: String,
}

/// POST /job_matcher/search_jobs
///
/// Never fails from the caller's point of view; worst case is the cascade's
/// empty-but-well-typed fallback.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Value> {
    Json(search_jobs(&state, params).await)
}

pub async fn search_jobs(state: &AppState, params: SearchParams) -> Value {
    let key = cache_key("search_jobs", &original_params(&params));
    if let Some(hit) = state.cache.get(&key) {
        return hit;
    }

    let outcome = run_search_cascade(state.upstream.as_ref(), &params).await;

    match outcome.resolution {
        CascadeResolution::Stage(stage) => {
            state.cache.set(&key, outcome.payload.clone());
            if stage == 0 {
                audit::spawn_record(&state.audit, search_record(&params, &outcome.payload));
            }
        }
        // The fallback is not a real upstream answer; caching it would hide
        // recovery for the full TTL.
        CascadeResolution::Fallback => {}
    }

    outcome.payload
}

fn search_record(params: &SearchParams, payload: &Value) -> AuditRecord {
    AuditRecord::JobSearch {
        keywords: params.keywords.clone(),
        location: params.location.clone(),
        region: params.region.clone(),
        remote_ok: params.remote_ok.as_deref().unwrap_or("false") == "true",
        currency: params.currency.clone(),
        max_jobs: params
            .max_jobs
            .as_deref()
            .unwrap_or("30")
            .parse()
            .unwrap_or(30),
        total_found: payload.get("total_found").and_then(Value::as_i64),
    }
}

/// POST /job_matcher/analyze_cv
///
/// Plain JSON proxy; upstream failures surface verbatim. The audit row keeps
/// only derived facts about the resume, never its text.
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeCvRequest>,
) -> Result<Json<Value>, AppError> {
    let body = json!({ "resume_text": request.resume_text });
    let payload = state.upstream.post_json(ANALYZE_CV_PATH, &body).await?;

    let analysis = payload.get("analysis").cloned().unwrap_or(Value::Null);
    let skills = string_list(analysis.get("skills"));
    audit::spawn_record(
        &state.audit,
        AuditRecord::CvAnalysis {
            resume_hash: request.resume_text.len().to_string(),
            skills_count: skills.len() as i64,
            experience_years: analysis.get("experience_years").and_then(Value::as_f64),
            skills,
            job_keywords: string_list(analysis.get("job_keywords")),
        },
    );
    Ok(Json(payload))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audit::testing::RecordingAudit;
    use crate::audit::AuditStore;
    use crate::proxy::cache::ResponseCache;
    use crate::proxy::upstream::testing::StubUpstream;
    use crate::proxy::upstream::UpstreamFailure;

    fn state_with(upstream: Arc<StubUpstream>, audit: Arc<RecordingAudit>) -> AppState {
        AppState {
            upstream,
            cache: Arc::new(ResponseCache::new()),
            audit: audit as Arc<dyn AuditStore>,
        }
    }

    fn params() -> SearchParams {
        SearchParams {
            keywords: "Backend Engineer".to_string(),
            location: Some("Egypt".to_string()),
            region: None,
            remote_ok: Some("false".to_string()),
            max_jobs: Some("30".to_string()),
            currency: None,
        }
    }

    fn failure(status: u16) -> UpstreamFailure {
        UpstreamFailure {
            status,
            body: json!({"message": "boom"}),
        }
    }

    async fn drain_audit_tasks() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_repeat_search_is_served_from_cache() {
        let upstream = Arc::new(StubUpstream::new(vec![Ok(
            json!({"success": true, "total_found": 2}),
        )]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream.clone(), audit);

        let first = search_jobs(&state, params()).await;
        let second = search_jobs(&state, params()).await;

        assert_eq!(upstream.call_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_first_attempt_success_records_audit_with_total() {
        let upstream = Arc::new(StubUpstream::new(vec![Ok(
            json!({"success": true, "total_found": 7}),
        )]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream, audit.clone());

        search_jobs(&state, params()).await;
        drain_audit_tasks().await;

        let records = audit.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        match &records[0] {
            AuditRecord::JobSearch {
                keywords,
                max_jobs,
                remote_ok,
                total_found,
                ..
            } => {
                assert_eq!(keywords, "Backend Engineer");
                assert_eq!(*max_jobs, 30);
                assert!(!remote_ok);
                assert_eq!(*total_found, Some(7));
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_degraded_success_skips_audit() {
        let upstream = Arc::new(StubUpstream::new(vec![
            Err(failure(500)),
            Err(failure(500)),
            Ok(json!({"success": true, "total_found": 1})),
        ]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream.clone(), audit.clone());

        let payload = search_jobs(&state, params()).await;
        drain_audit_tasks().await;

        assert_eq!(upstream.call_count(), 3);
        assert_eq!(payload["total_found"], 1);
        assert!(audit.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let upstream = Arc::new(StubUpstream::new(vec![
            Err(failure(500)),
            Err(failure(500)),
            Err(failure(500)),
            Ok(json!({"success": true, "total_found": 3})),
        ]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream.clone(), audit);

        let fallback = search_jobs(&state, params()).await;
        assert_eq!(fallback["total_found"], 0);
        assert_eq!(fallback["jobs"], json!([]));

        // The backend came back; the next search must reach it.
        let recovered = search_jobs(&state, params()).await;
        assert_eq!(upstream.call_count(), 4);
        assert_eq!(recovered["total_found"], 3);
    }

    #[tokio::test]
    async fn test_degraded_success_is_cached() {
        let upstream = Arc::new(StubUpstream::new(vec![
            Err(failure(500)),
            Ok(json!({"success": true, "total_found": 5})),
        ]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream.clone(), audit);

        search_jobs(&state, params()).await;
        let cached = search_jobs(&state, params()).await;

        assert_eq!(upstream.call_count(), 2);
        assert_eq!(cached["total_found"], 5);
    }

    #[tokio::test]
    async fn test_analyze_cv_summarizes_without_storing_text() {
        let upstream = Arc::new(StubUpstream::new(vec![Ok(json!({
            "analysis": {
                "skills": ["rust", "sql"],
                "experience_years": 4.5,
                "job_keywords": ["backend"]
            }
        }))]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream, audit.clone());

        handle_analyze_cv(
            State(state),
            Json(AnalyzeCvRequest {
                resume_text: "ten years of everything".to_string(),
            }),
        )
        .await
        .unwrap();
        drain_audit_tasks().await;

        let records = audit.records.lock().unwrap();
        match &records[0] {
            AuditRecord::CvAnalysis {
                resume_hash,
                skills_count,
                experience_years,
                skills,
                job_keywords,
            } => {
                assert_eq!(resume_hash, &"ten years of everything".len().to_string());
                assert_eq!(*skills_count, 2);
                assert_eq!(*experience_years, Some(4.5));
                assert_eq!(skills, &vec!["rust".to_string(), "sql".to_string()]);
                assert_eq!(job_keywords, &vec!["backend".to_string()]);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_cv_propagates_upstream_failure() {
        let upstream = Arc::new(StubUpstream::new(vec![Err(failure(422))]));
        let audit = Arc::new(RecordingAudit::default());
        let state = state_with(upstream, audit);

        let err = handle_analyze_cv(
            State(state),
            Json(AnalyzeCvRequest {
                resume_text: "x".to_string(),
            }),
        )
        .await
        .unwrap_err();

        match err {
            AppError::Upstream { status, .. } => assert_eq!(status, 422),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
