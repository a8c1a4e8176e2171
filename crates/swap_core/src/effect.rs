use url::Url;

use crate::{AttemptId, JobId, Photo};

/// Side effects requested by [`crate::update`]; executed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send something back to the chat.
    Reply(Outbound),
    /// Stage the source image with the image host.
    UploadSource { attempt: AttemptId, photo: Photo },
    /// Stage the target image, then submit the job for `source` + target.
    SubmitJob {
        attempt: AttemptId,
        source: Url,
        target: Photo,
    },
    /// Start polling a submitted job until it resolves.
    WatchJob { attempt: AttemptId, job_id: JobId },
    /// Stop polling a job; no further status calls may be issued for it.
    CancelJob { job_id: JobId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Image { image: Photo, caption: String },
}

impl Effect {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Effect::Reply(Outbound::Text(text.into()))
    }
}
