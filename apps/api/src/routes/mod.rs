pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{footprint, interview, jobs, report, resume};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Footprint scanner (cached query proxies)
        .route(
            "/footprint_scanner/analyze_github",
            post(footprint::handle_analyze_github),
        )
        .route(
            "/footprint_scanner/analyze_linkedin",
            post(footprint::handle_analyze_linkedin),
        )
        .route(
            "/footprint_scanner/analyze_stackoverflow",
            post(footprint::handle_analyze_stackoverflow),
        )
        // Job matcher (cascaded search + CV analysis)
        .route("/job_matcher/search_jobs", post(jobs::handle_search_jobs))
        .route("/job_matcher/analyze_cv", post(jobs::handle_analyze_cv))
        // AI interviewer
        .route(
            "/ai_interviewer/generate_questions",
            post(interview::handle_generate_questions),
        )
        .route(
            "/ai_interviewer/analyze_response",
            post(interview::handle_analyze_response),
        )
        .route(
            "/ai_interviewer/generate_profile",
            post(interview::handle_generate_profile),
        )
        // Resume writer (multipart / PDF passthrough)
        .route("/resume_writer", post(resume::handle_rewrite))
        .route("/resume_writer/pdf", post(resume::handle_rewrite_pdf))
        .route(
            "/resume_writer/pdf-from-text",
            post(resume::handle_pdf_from_text),
        )
        // Reports
        .route("/create_report", post(report::handle_create_report))
        .route("/create_report/aggregate", post(report::handle_aggregate))
        .with_state(state)
}
