use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use swap_logging::{swap_info, swap_warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    classify_result, ClientSettings, FailureReason, FetchError, FetchSettings, HostSettings,
    HttpImageHost, HttpSwapClient, ImageHost, Job, JobId, MalformedResult, PollOutcome,
    PollSettings, Poller, ProgressSink, ReqwestFetcher, ResultFetcher, ResultRef, SubmitError,
    SwapApi, UploadError,
};

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub client: ClientSettings,
    pub host: HostSettings,
    pub poll: PollSettings,
    pub fetch: FetchSettings,
    /// RFC3339 timestamp source used to stamp jobs.
    pub now_utc: Clock,
}

impl EngineConfig {
    pub fn default_with_key(api_key: impl Into<String>) -> Self {
        Self {
            client: ClientSettings {
                api_key: api_key.into(),
                ..ClientSettings::default()
            },
            host: HostSettings::default(),
            poll: PollSettings::default(),
            fetch: FetchSettings::default(),
            now_utc: Arc::new(|| "1970-01-01T00:00:00Z".to_string()),
        }
    }
}

/// Failure while staging the target image or submitting the job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("could not upload the target image: {0}")]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// How a watched job ended, after result extraction and download.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Delivered { url: Option<Url>, image: Vec<u8> },
    FetchFailed { url: Url, error: FetchError },
    Malformed(MalformedResult),
    Failed(FailureReason),
    TimedOut { waited: Duration },
    Cancelled,
}

/// Bundles the remote collaborators behind one cloneable handle.
#[derive(Clone)]
pub struct SwapEngine {
    host: Arc<dyn ImageHost>,
    api: Arc<dyn SwapApi>,
    fetcher: Arc<dyn ResultFetcher>,
    poll: PollSettings,
    now_utc: Clock,
}

impl SwapEngine {
    pub fn new(config: EngineConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_parts(
            Arc::new(HttpImageHost::new(config.host)?),
            Arc::new(HttpSwapClient::new(config.client)?),
            Arc::new(ReqwestFetcher::new(config.fetch)?),
            config.poll,
            config.now_utc,
        ))
    }

    pub fn from_parts(
        host: Arc<dyn ImageHost>,
        api: Arc<dyn SwapApi>,
        fetcher: Arc<dyn ResultFetcher>,
        poll: PollSettings,
        now_utc: Clock,
    ) -> Self {
        Self {
            host,
            api,
            fetcher,
            poll,
            now_utc,
        }
    }

    pub fn now_utc(&self) -> String {
        (self.now_utc)()
    }

    pub async fn upload(&self, image: Bytes) -> Result<Url, UploadError> {
        self.host.upload(image).await
    }

    /// Stages the target image, then submits the job. Neither step is retried.
    pub async fn start(&self, source: &Url, target: Bytes) -> Result<JobId, StartError> {
        let target = self.host.upload(target).await?;
        Ok(self.api.submit(source, &target).await?)
    }

    /// Polls `job_id` to a terminal state, then extracts and downloads the result.
    pub async fn watch(
        &self,
        job_id: JobId,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let job = Job::new(job_id.clone(), self.now_utc());
        let outcome = Poller::new(job, self.poll.clone())
            .run(self.api.as_ref(), sink, cancel)
            .await;

        let payload = match outcome {
            PollOutcome::Success(payload) => payload,
            PollOutcome::Failure(reason) => return JobOutcome::Failed(reason),
            PollOutcome::TimedOut { elapsed, .. } => return JobOutcome::TimedOut { waited: elapsed },
            PollOutcome::Cancelled => return JobOutcome::Cancelled,
        };

        let url = match classify_result(&payload) {
            Ok(ResultRef::Url(url)) => url,
            Ok(ResultRef::Inline { mime, bytes }) => {
                swap_info!("Job {} returned an inline {} result", job_id, mime);
                return JobOutcome::Delivered {
                    url: None,
                    image: bytes,
                };
            }
            Err(malformed) => {
                swap_warn!("Job {}: {}", job_id, malformed);
                return JobOutcome::Malformed(malformed);
            }
        };
        if cancel.is_cancelled() {
            return JobOutcome::Cancelled;
        }

        match self.fetcher.fetch(&url).await {
            Ok(image) => JobOutcome::Delivered {
                url: Some(url),
                image: image.bytes,
            },
            Err(error) => {
                swap_warn!("Job {}: fetching {} failed: {} ({})", job_id, url, error, error.message);
                JobOutcome::FetchFailed { url, error }
            }
        }
    }
}
