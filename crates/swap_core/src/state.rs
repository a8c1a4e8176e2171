use std::fmt;

use url::Url;

pub type JobId = String;

/// Monotonic token identifying one start-to-idle pass through a session.
/// Async results tagged with an older attempt are ignored.
pub type AttemptId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    AwaitingSource,
    UploadingSource,
    AwaitingTarget,
    Submitting,
    Running,
}

impl Stage {
    /// Whether an upload, submit or job is currently in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Stage::UploadingSource | Stage::Submitting | Stage::Running
        )
    }
}

/// Raw image bytes as received from the chat.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Photo(Vec<u8>);

impl Photo {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Photo({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub id: JobId,
    pub submitted_at: String,
}

/// Conversation state for one chat.
///
/// `source_ref` and `active_job` are scratch state: they are cleared on every
/// transition into [`Stage::Idle`], whatever caused it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    stage: Stage,
    source_ref: Option<Url>,
    active_job: Option<ActiveJob>,
    attempt: AttemptId,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source_ref(&self) -> Option<&Url> {
        self.source_ref.as_ref()
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub(crate) fn is_current(&self, attempt: AttemptId) -> bool {
        self.stage != Stage::Idle && self.attempt == attempt
    }

    pub(crate) fn is_watching(&self, job_id: &str) -> bool {
        self.stage == Stage::Running
            && self
                .active_job
                .as_ref()
                .is_some_and(|job| job.id == job_id)
    }

    pub(crate) fn begin(&mut self) -> AttemptId {
        self.reset();
        self.attempt += 1;
        self.stage = Stage::AwaitingSource;
        self.attempt
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        debug_assert!(stage != Stage::Idle, "use reset() to go idle");
        self.stage = stage;
    }

    pub(crate) fn source_staged(&mut self, url: Url) {
        self.source_ref = Some(url);
        self.stage = Stage::AwaitingTarget;
    }

    pub(crate) fn job_started(&mut self, job: ActiveJob) {
        self.active_job = Some(job);
        self.stage = Stage::Running;
    }

    /// The only way back to `Idle`. Returns the job that was active, if any.
    pub(crate) fn reset(&mut self) -> Option<ActiveJob> {
        self.stage = Stage::Idle;
        self.source_ref = None;
        self.active_job.take()
    }
}
