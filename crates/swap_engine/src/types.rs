use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::StatusError;

pub type JobId = String;

/// Normalised remote job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Unknown,
}

impl JobStatus {
    /// Case-insensitive mapping of the remote status string.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed,
            "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
            "IN_QUEUE" | "PENDING" | "QUEUED" => JobStatus::Queued,
            "IN_PROGRESS" | "PROCESSING" | "RUNNING" => JobStatus::Running,
            _ => JobStatus::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// One decoded status read.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusPayload {
    /// Status string exactly as the remote sent it.
    pub status_raw: String,
    pub status: JobStatus,
    /// Whole response body, kept for result extraction.
    pub body: Value,
}

impl JobStatusPayload {
    pub fn from_body(body: Value) -> Result<Self, StatusError> {
        let status_raw = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| StatusError::Decode("response has no status field".into()))?
            .to_string();
        Ok(Self {
            status: JobStatus::parse(&status_raw),
            status_raw,
            body,
        })
    }
}

/// Local view of a remote job. Only ever changed by re-reading its status.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub created_at: String,
    pub result_payload: Option<Value>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            created_at: created_at.into(),
            result_payload: None,
        }
    }

    /// Applies a status read; returns the previous status when it changed.
    pub(crate) fn observe(&mut self, payload: &JobStatusPayload) -> Option<JobStatus> {
        let previous = self.status;
        self.status = payload.status;
        if payload.status == JobStatus::Completed {
            self.result_payload = Some(payload.body.clone());
        }
        (previous != payload.status).then_some(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub checks: u32,
    pub elapsed: Duration,
}

/// Why a job ended without a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The remote service reported a failed or cancelled job.
    Terminal { status: String },
    /// A status read failed; reads are not retried.
    StatusUnavailable(StatusError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Terminal { status } => write!(f, "remote job ended with status {status}"),
            FailureReason::StatusUnavailable(err) => write!(f, "could not read job status: {err}"),
        }
    }
}

/// Terminal result of one poller run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Success(Value),
    Failure(FailureReason),
    TimedOut { elapsed: Duration, checks: u32 },
    Cancelled,
}
