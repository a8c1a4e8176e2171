use url::Url;

use crate::{AttemptId, Command, JobId, Photo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User sent a recognised command.
    Command(Command),
    /// User sent text that is not a command.
    Text(String),
    /// User sent a photo.
    PhotoReceived(Photo),
    /// Image host finished staging the source image.
    SourceUploaded {
        attempt: AttemptId,
        result: Result<Url, String>,
    },
    /// Target upload and job submission finished.
    JobSubmitted {
        attempt: AttemptId,
        submitted_at: String,
        result: Result<JobId, String>,
    },
    /// Poller progress for a running job.
    JobProgress {
        job_id: JobId,
        elapsed_secs: u64,
        checks: u32,
    },
    /// Poller resolved a job.
    JobFinished { job_id: JobId, result: JobResult },
    /// An effect task for `attempt` died without reporting back.
    UnexpectedFailure { attempt: AttemptId, detail: String },
    /// A cancelled watch reporting back; the session was already reset.
    NoOp,
}

/// User-facing classification of a resolved job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// The result image was retrieved.
    Delivered { url: Option<Url>, image: Photo },
    /// The job completed but its image could not be downloaded.
    FetchFailed { url: Url, reason: String },
    /// The job completed but carried no usable result reference.
    Malformed { dump: String },
    /// The remote service reported a failure, or its status became unreadable.
    Failed { reason: String },
    /// The deadline passed while the job was still in flight.
    TimedOut { waited_secs: u64 },
}
