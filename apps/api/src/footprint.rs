//! Digital-footprint lookups (GitHub / LinkedIn / Stack Overflow) proxied to
//! the analysis backend.
//!
//! All three providers share one cache-through path: normalized key lookup,
//! a single upstream call on miss, success stored for the fixed TTL. Every
//! successful lookup leaves a footprint audit row (provider, identifier,
//! response size) behind, cache hit or not.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::audit::{self, AuditRecord};
use crate::errors::AppError;
use crate::proxy::cache::ResponseCache;
use crate::proxy::params::{cache_key, query_pairs, ParamSet};
use crate::proxy::upstream::{Upstream, UpstreamFailure};
use crate::state::AppState;

pub const GITHUB_PATH: &str = "/footprint_scanner/analyze_github";
pub const LINKEDIN_PATH: &str = "/footprint_scanner/analyze_linkedin";
pub const STACKOVERFLOW_PATH: &str = "/footprint_scanner/analyze_stackoverflow";

fn default_target_role() -> String {
    "Software Developer".to_string()
}

fn default_region() -> String {
    "Global".to_string()
}

#[derive(Debug, Deserialize)]
pub struct GithubQuery {
    pub username: String,
    #[serde(default = "default_target_role")]
    pub target_role: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkedinQuery {
    pub username: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StackOverflowQuery {
    pub user_id: String,
}

/// Cache-through proxy shared by the providers. Concurrent misses for the
/// same key may both call upstream and both write; last writer wins.
async fn proxy_cached(
    upstream: &dyn Upstream,
    cache: &ResponseCache,
    path: &str,
    params: &ParamSet,
) -> Result<Value, UpstreamFailure> {
    let key = cache_key(path, params);
    if let Some(hit) = cache.get(&key) {
        debug!(key, "footprint cache hit");
        return Ok(hit);
    }
    let payload = upstream.post_query(path, &query_pairs(params)).await?;
    cache.set(&key, payload.clone());
    Ok(payload)
}

fn response_size(payload: &Value) -> i64 {
    serde_json::to_string(payload)
        .map(|s| s.len() as i64)
        .unwrap_or(0)
}

/// POST /footprint_scanner/analyze_github
pub async fn handle_analyze_github(
    State(state): State<AppState>,
    Query(query): Query<GithubQuery>,
) -> Result<Json<Value>, AppError> {
    let params: ParamSet = vec![
        ("username", Some(query.username.clone())),
        ("target_role", Some(query.target_role)),
        ("region", Some(query.region)),
    ];
    let payload = proxy_cached(state.upstream.as_ref(), &state.cache, GITHUB_PATH, &params).await?;

    audit::spawn_record(
        &state.audit,
        AuditRecord::Footprint {
            provider: "github",
            identifier: query.username,
            response_size: response_size(&payload),
        },
    );
    Ok(Json(payload))
}

/// POST /footprint_scanner/analyze_linkedin
///
/// Accepts either a username or a full profile URL; the identity recorded is
/// whichever was supplied.
pub async fn handle_analyze_linkedin(
    State(state): State<AppState>,
    Query(query): Query<LinkedinQuery>,
) -> Result<Json<Value>, AppError> {
    let params: ParamSet = vec![
        ("username", query.username.clone()),
        ("profile_url", query.profile_url.clone()),
    ];
    let payload =
        proxy_cached(state.upstream.as_ref(), &state.cache, LINKEDIN_PATH, &params).await?;

    let identifier = query
        .username
        .or(query.profile_url)
        .unwrap_or_default();
    audit::spawn_record(
        &state.audit,
        AuditRecord::Footprint {
            provider: "linkedin",
            identifier,
            response_size: response_size(&payload),
        },
    );
    Ok(Json(payload))
}

/// POST /footprint_scanner/analyze_stackoverflow
pub async fn handle_analyze_stackoverflow(
    State(state): State<AppState>,
    Query(query): Query<StackOverflowQuery>,
) -> Result<Json<Value>, AppError> {
    let params: ParamSet = vec![("user_id", Some(query.user_id.clone()))];
    let payload = proxy_cached(
        state.upstream.as_ref(),
        &state.cache,
        STACKOVERFLOW_PATH,
        &params,
    )
    .await?;

    audit::spawn_record(
        &state.audit,
        AuditRecord::Footprint {
            provider: "stackoverflow",
            identifier: query.user_id,
            response_size: response_size(&payload),
        },
    );
    Ok(Json(payload))
}
