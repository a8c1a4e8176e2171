use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use swap_core::{AttemptId, Effect, JobId, JobResult, Msg, Photo};
use swap_engine::{JobOutcome, JobProgress, ProgressSink, SwapEngine};
use swap_logging::{swap_debug, swap_error, swap_info, swap_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::hub::{ChatId, Envelope, Outbox};

/// Executes core effects: replies inline, remote work as supervised tasks
/// whose results come back through the hub's event channel.
pub struct EffectRunner {
    engine: SwapEngine,
    outbox: Arc<dyn Outbox>,
    events: mpsc::UnboundedSender<Envelope>,
    watches: HashMap<JobId, CancellationToken>,
}

impl EffectRunner {
    pub fn new(
        engine: SwapEngine,
        outbox: Arc<dyn Outbox>,
        events: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        Self {
            engine,
            outbox,
            events,
            watches: HashMap::new(),
        }
    }

    pub async fn run(&mut self, chat: &str, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Reply(message) => self.outbox.deliver(chat, message).await,
                Effect::UploadSource { attempt, photo } => {
                    swap_info!(chat = chat; "Uploading source image ({} bytes)", photo.len());
                    let engine = self.engine.clone();
                    self.spawn_guarded(chat, attempt, async move {
                        let result = engine
                            .upload(to_bytes(photo))
                            .await
                            .map_err(|err| err.to_string());
                        Msg::SourceUploaded { attempt, result }
                    });
                }
                Effect::SubmitJob {
                    attempt,
                    source,
                    target,
                } => {
                    swap_info!(chat = chat; "Uploading target ({} bytes) and submitting", target.len());
                    let engine = self.engine.clone();
                    self.spawn_guarded(chat, attempt, async move {
                        let result = engine
                            .start(&source, to_bytes(target))
                            .await
                            .map_err(|err| err.to_string());
                        Msg::JobSubmitted {
                            attempt,
                            submitted_at: engine.now_utc(),
                            result,
                        }
                    });
                }
                Effect::WatchJob { attempt, job_id } => {
                    let cancel = CancellationToken::new();
                    self.watches.insert(job_id.clone(), cancel.clone());
                    let engine = self.engine.clone();
                    let sink = ChannelProgressSink::new(chat, self.events.clone());
                    self.spawn_guarded(chat, attempt, async move {
                        let outcome = engine.watch(job_id.clone(), &sink, &cancel).await;
                        match map_outcome(outcome) {
                            Some(result) => Msg::JobFinished { job_id, result },
                            None => Msg::NoOp,
                        }
                    });
                }
                Effect::CancelJob { job_id } => {
                    if let Some(cancel) = self.watches.remove(&job_id) {
                        swap_info!(chat = chat; "Cancelling watch of job {}", job_id);
                        cancel.cancel();
                    }
                }
            }
        }
    }

    /// Forgets the cancellation handle of a job that resolved on its own.
    pub fn release(&mut self, job_id: &str) {
        self.watches.remove(job_id);
    }

    pub fn cancel_all(&mut self) {
        for (_, cancel) in self.watches.drain() {
            cancel.cancel();
        }
    }

    /// Runs `task` and posts its message back. A panicking task is reported as
    /// `UnexpectedFailure` so the session still resets.
    fn spawn_guarded<F>(&self, chat: &str, attempt: AttemptId, task: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let chat: ChatId = chat.to_string();
        let events = self.events.clone();
        let handle = tokio::spawn(task);
        tokio::spawn(async move {
            let msg = match handle.await {
                Ok(msg) => msg,
                Err(err) => {
                    swap_error!(chat = chat; "Effect task for attempt {} died: {}", attempt, err);
                    Msg::UnexpectedFailure {
                        attempt,
                        detail: err.to_string(),
                    }
                }
            };
            if events.send(Envelope { chat, msg }).is_err() {
                swap_debug!("Session hub gone; dropping effect result");
            }
        });
    }
}

fn to_bytes(photo: Photo) -> Bytes {
    Bytes::from(photo.into_bytes())
}

/// Maps an engine outcome onto what the user is told; `None` for cancelled jobs.
pub fn map_outcome(outcome: JobOutcome) -> Option<JobResult> {
    let result = match outcome {
        JobOutcome::Delivered { url, image } => JobResult::Delivered {
            url,
            image: Photo::new(image),
        },
        JobOutcome::FetchFailed { url, error } => JobResult::FetchFailed {
            url,
            reason: error.to_string(),
        },
        JobOutcome::Malformed(malformed) => JobResult::Malformed {
            dump: malformed.dump,
        },
        JobOutcome::Failed(reason) => JobResult::Failed {
            reason: reason.to_string(),
        },
        JobOutcome::TimedOut { waited } => JobResult::TimedOut {
            waited_secs: waited.as_secs(),
        },
        JobOutcome::Cancelled => return None,
    };
    Some(result)
}

struct ChannelProgressSink {
    chat: ChatId,
    events: mpsc::UnboundedSender<Envelope>,
}

impl ChannelProgressSink {
    fn new(chat: &str, events: mpsc::UnboundedSender<Envelope>) -> Self {
        Self {
            chat: chat.to_string(),
            events,
        }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, progress: JobProgress) {
        let msg = Msg::JobProgress {
            job_id: progress.job_id,
            elapsed_secs: progress.elapsed.as_secs(),
            checks: progress.checks,
        };
        if self.events.send(Envelope::new(self.chat.clone(), msg)).is_err() {
            swap_warn!(chat = self.chat; "Progress dropped; session hub gone");
        }
    }
}
