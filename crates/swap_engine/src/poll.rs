use std::time::Duration;

use swap_logging::{swap_debug, swap_info, swap_warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{FailureReason, Job, JobProgress, JobStatus, PollOutcome, SwapApi};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Deadline measured from the first status check of the job.
    pub max_wait: Duration,
    /// Report progress on every Nth in-flight check; 0 disables reports.
    pub progress_every: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(180),
            progress_every: 5,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: JobProgress);
}

/// Drives status reads for exactly one job until it resolves. Disposable.
///
/// Unrecognised status strings keep the job in flight (logged at warn);
/// only the deadline or cancellation can stop such a job. A failed status
/// read ends the run immediately.
pub struct Poller {
    job: Job,
    settings: PollSettings,
}

impl Poller {
    pub fn new(job: Job, settings: PollSettings) -> Self {
        Self { job, settings }
    }

    pub async fn run(
        mut self,
        api: &dyn SwapApi,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let started = Instant::now();
        let mut checks: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                swap_info!("Polling of job {} cancelled after {} checks", self.job.id, checks);
                return PollOutcome::Cancelled;
            }
            let elapsed = started.elapsed();
            if elapsed >= self.settings.max_wait {
                swap_warn!(
                    "Job {} still {:?} after {:?} ({} checks); giving up",
                    self.job.id,
                    self.job.status,
                    elapsed,
                    checks
                );
                return PollOutcome::TimedOut { elapsed, checks };
            }

            checks += 1;
            let payload = match api.status(&self.job.id).await {
                Ok(payload) => payload,
                Err(err) => {
                    swap_warn!("Status read {} for job {} failed: {}", checks, self.job.id, err);
                    return PollOutcome::Failure(FailureReason::StatusUnavailable(err));
                }
            };
            if let Some(previous) = self.job.observe(&payload) {
                swap_debug!(
                    "Job {} {:?} -> {:?} (created {})",
                    self.job.id,
                    previous,
                    self.job.status,
                    self.job.created_at
                );
            }

            match payload.status {
                JobStatus::Completed => {
                    swap_info!("Job {} completed after {} checks", self.job.id, checks);
                    let body = self.job.result_payload.take().unwrap_or(payload.body);
                    return PollOutcome::Success(body);
                }
                JobStatus::Failed | JobStatus::Cancelled => {
                    return PollOutcome::Failure(FailureReason::Terminal {
                        status: payload.status_raw,
                    });
                }
                JobStatus::Unknown => swap_warn!(
                    "Job {} reported unrecognised status {:?}; treating as in flight",
                    self.job.id,
                    payload.status_raw
                ),
                JobStatus::Queued | JobStatus::Running => {}
            }

            if self.settings.progress_every > 0 && checks % self.settings.progress_every == 0 {
                sink.emit(JobProgress {
                    job_id: self.job.id.clone(),
                    checks,
                    elapsed: started.elapsed(),
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
    }
}
