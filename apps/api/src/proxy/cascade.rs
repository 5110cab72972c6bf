//! Degradation cascade for the job-search operation.
//!
//! Job search is the one operation whose caller contract is "never surface a
//! transport error": when the backend is flaky or rejects malformed
//! parameters, we progressively simplify the request instead of giving up.
//! The stages are a fixed ordered list, walked once, first success wins:
//!
//! 0. caller's parameters exactly as supplied
//! 1. normalized: trimmed keywords/location, defaults filled in
//! 2. minimal: keywords only, small fixed result count
//!
//! If all three fail, a well-formed empty result set echoing the caller's
//! original identity fields is synthesized. At most three upstream calls per
//! logical search; no stage is ever retried or reordered.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::proxy::params::{query_pairs, ParamSet};
use crate::proxy::upstream::Upstream;

pub const SEARCH_PATH: &str = "/job_matcher/search_jobs";

/// Caller-supplied job-search parameters, loosely typed on purpose: the
/// upstream contract is query-string scalars, so everything stays a string.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keywords: String,
    pub location: Option<String>,
    pub region: Option<String>,
    pub remote_ok: Option<String>,
    pub max_jobs: Option<String>,
    pub currency: Option<String>,
}

/// Which attempt produced the returned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeResolution {
    /// Stage index 0, 1 or 2 succeeded.
    Stage(usize),
    /// All stages failed; the payload is the synthesized empty result.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub payload: Value,
    pub resolution: CascadeResolution,
}

struct SearchStage {
    name: &'static str,
    build: fn(&SearchParams) -> ParamSet,
}

const STAGES: [SearchStage; 3] = [
    SearchStage {
        name: "original",
        build: original_params,
    },
    SearchStage {
        name: "normalized",
        build: normalized_params,
    },
    SearchStage {
        name: "minimal",
        build: minimal_params,
    },
];

/// Stage 0: forward the caller's parameter set untouched.
pub fn original_params(params: &SearchParams) -> ParamSet {
    vec![
        ("keywords", Some(params.keywords.clone())),
        ("location", params.location.clone()),
        ("region", params.region.clone()),
        ("remote_ok", params.remote_ok.clone()),
        ("max_jobs", params.max_jobs.clone()),
        ("currency", params.currency.clone()),
    ]
}

/// Stage 1: fixed field order, trimmed text, explicit defaults. Region and
/// currency are dropped here; they are the fields the backend most often
/// rejects.
fn normalized_params(params: &SearchParams) -> ParamSet {
    vec![
        ("keywords", Some(params.keywords.trim().to_string())),
        (
            "location",
            Some(params.location.as_deref().unwrap_or("").trim().to_string()),
        ),
        ("max_jobs", Some(non_empty_or(&params.max_jobs, "30"))),
        ("remote_ok", Some(non_empty_or(&params.remote_ok, "false"))),
    ]
}

/// Stage 2: keywords only, small fixed result count.
fn minimal_params(params: &SearchParams) -> ParamSet {
    vec![
        ("keywords", Some(params.keywords.trim().to_string())),
        ("max_jobs", Some("20".to_string())),
        ("remote_ok", Some("false".to_string())),
    ]
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Walks the stage list, returning the first successful payload, or the
/// terminal fallback when every stage fails. Diagnostics are advisory only;
/// they never alter the fixed stage order.
pub async fn run_search_cascade(upstream: &dyn Upstream, params: &SearchParams) -> SearchOutcome {
    for (index, stage) in STAGES.iter().enumerate() {
        let stage_params = (stage.build)(params);
        match upstream
            .post_query(SEARCH_PATH, &query_pairs(&stage_params))
            .await
        {
            Ok(payload) => {
                return SearchOutcome {
                    payload,
                    resolution: CascadeResolution::Stage(index),
                }
            }
            Err(failure) => {
                warn!(
                    stage = stage.name,
                    status = failure.status,
                    body = %failure.body,
                    params = ?stage_params,
                    "job search upstream attempt failed"
                );
            }
        }
    }

    SearchOutcome {
        payload: empty_search_result(params),
        resolution: CascadeResolution::Fallback,
    }
}

/// Terminal fallback: an empty but well-typed result set echoing the
/// caller's original identity fields, not the reduced Stage-2 values.
fn empty_search_result(params: &SearchParams) -> Value {
    json!({
        "success": true,
        "jobs": [],
        "total_found": 0,
        "keywords": params.keywords,
        "location": params.location.as_deref().unwrap_or(""),
        "region": params.region.as_deref().unwrap_or(""),
        "remote_ok": params.remote_ok.as_deref() == Some("true"),
        "currency": params.currency.as_deref().unwrap_or(""),
    })
}
