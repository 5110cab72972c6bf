//! Fire-and-forget audit trail.
//!
//! Every successful proxy call leaves a small summary row behind: who was
//! looked up, what was searched, how big the answer was. The rows are
//! write-only from this service's perspective; the reporting layer reads
//! them elsewhere. Writes are spawned off the response path and a failure is
//! logged, never surfaced to the HTTP caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// One summary row, derived only from data already on hand when the call
/// resolved. No extra upstream calls are made to enrich a record.
#[derive(Debug, Clone)]
pub enum AuditRecord {
    Footprint {
        provider: &'static str,
        identifier: String,
        response_size: i64,
    },
    JobSearch {
        keywords: String,
        location: Option<String>,
        region: Option<String>,
        remote_ok: bool,
        currency: Option<String>,
        max_jobs: i64,
        total_found: Option<i64>,
    },
    CvAnalysis {
        resume_hash: String,
        skills_count: i64,
        experience_years: Option<f64>,
        skills: Vec<String>,
        job_keywords: Vec<String>,
    },
    QuestionGen {
        job_description: String,
        interview_type: Option<String>,
        num_questions: Option<i64>,
        total_questions: Option<i64>,
    },
    ResponseAnalysis {
        question: String,
        response: String,
        question_type: Option<String>,
    },
    ProfileGen {
        responses_count: i64,
        summary: Option<String>,
    },
}

/// Persistence collaborator for audit rows. Behind a trait so tests can
/// capture records without a database.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, record: AuditRecord) -> anyhow::Result<()>;
}

/// Spawns the write as a detached task. The response never waits on it and
/// never learns whether it worked.
pub fn spawn_record(store: &Arc<dyn AuditStore>, record: AuditRecord) {
    let store = Arc::clone(store);
    tokio::spawn(async move {
        if let Err(e) = store.record(record).await {
            warn!("audit write failed: {e:#}");
        }
    });
}

/// PostgreSQL-backed store: one table per record kind, plain INSERTs.
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn record(&self, record: AuditRecord) -> anyhow::Result<()> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        match record {
            AuditRecord::Footprint {
                provider,
                identifier,
                response_size,
            } => {
                sqlx::query(
                    "INSERT INTO footprint_logs (id, provider, identifier, response_size, created_at)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(id)
                .bind(provider)
                .bind(identifier)
                .bind(response_size)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            AuditRecord::JobSearch {
                keywords,
                location,
                region,
                remote_ok,
                currency,
                max_jobs,
                total_found,
            } => {
                sqlx::query(
                    "INSERT INTO job_search_logs
                     (id, keywords, location, region, remote_ok, currency, max_jobs, total_found, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(id)
                .bind(keywords)
                .bind(location)
                .bind(region)
                .bind(remote_ok)
                .bind(currency)
                .bind(max_jobs)
                .bind(total_found)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            AuditRecord::CvAnalysis {
                resume_hash,
                skills_count,
                experience_years,
                skills,
                job_keywords,
            } => {
                sqlx::query(
                    "INSERT INTO cv_analysis_logs
                     (id, resume_hash, skills_count, experience_years, skills, job_keywords, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(id)
                .bind(resume_hash)
                .bind(skills_count)
                .bind(experience_years)
                .bind(&skills)
                .bind(&job_keywords)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            AuditRecord::QuestionGen {
                job_description,
                interview_type,
                num_questions,
                total_questions,
            } => {
                sqlx::query(
                    "INSERT INTO question_gen_logs
                     (id, job_description, interview_type, num_questions, total_questions, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(id)
                .bind(job_description)
                .bind(interview_type)
                .bind(num_questions)
                .bind(total_questions)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            AuditRecord::ResponseAnalysis {
                question,
                response,
                question_type,
            } => {
                sqlx::query(
                    "INSERT INTO response_analysis_logs
                     (id, question, response, question_type, created_at)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(id)
                .bind(question)
                .bind(response)
                .bind(question_type)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            AuditRecord::ProfileGen {
                responses_count,
                summary,
            } => {
                sqlx::query(
                    "INSERT INTO profile_gen_logs (id, responses_count, summary, created_at)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(id)
                .bind(responses_count)
                .bind(summary)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures records in memory so tests can assert what was written.
    #[derive(Default)]
    pub struct RecordingAudit {
        pub records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditStore for RecordingAudit {
        async fn record(&self, record: AuditRecord) -> anyhow::Result<()> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }
}
