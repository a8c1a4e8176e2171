//! Swap engine: remote collaborators, job polling and result extraction.
mod classify;
mod client;
mod engine;
mod fetch;
mod host;
mod poll;
mod types;

pub use classify::{classify_result, MalformedResult, ResultRef};
pub use client::{ClientSettings, HttpSwapClient, StatusError, SubmitError, SwapApi};
pub use engine::{Clock, EngineConfig, JobOutcome, StartError, SwapEngine};
pub use fetch::{FailureKind, FetchError, FetchSettings, FetchedImage, ReqwestFetcher, ResultFetcher};
pub use host::{check_upload_size, HostSettings, HttpImageHost, ImageHost, UploadError};
pub use poll::{PollSettings, Poller, ProgressSink};
pub use types::{FailureReason, Job, JobId, JobProgress, JobStatus, JobStatusPayload, PollOutcome};
