// [libs/domain/models/src/job.rs]
/*!
 * IngestionJob and IngestionLog entities — one job per run, one log
 * written unconditionally at the end of every run that acquired a lock.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unrecognized job status '{other}'")),
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub job_id: String,
    pub tenant_id: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_pages: i64,
    pub processed_pages: i64,
    pub progress: i64,
}

impl IngestionJob {
    /// `progress = floor(100 * processed_pages / max(total_pages, 1))`,
    /// capped at 99 until the job reaches a terminal state. Spec §4.8.
    pub fn compute_progress(processed_pages: i64, total_pages: i64, terminal: bool) -> i64 {
        if terminal {
            return 100;
        }
        let denominator = total_pages.max(1);
        let raw = (100 * processed_pages) / denominator;
        raw.clamp(0, 99)
    }
}

/// Append-only audit row. Every job that acquired a lock produces exactly
/// one of these, success or failure, per spec §3's IngestionLog invariant.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionLog {
    pub log_id: String,
    pub tenant_id: String,
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub new_ingested: i64,
    pub updated: i64,
    pub errors: i64,
    pub error: Option<String>,
}
