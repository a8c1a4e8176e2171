#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use serde_json::{json, Value};
use swap_engine::{
    FailureKind, FetchError, FetchedImage, ImageHost, JobId, JobProgress, JobStatusPayload,
    ProgressSink, ResultFetcher, StatusError, SubmitError, SwapApi, UploadError,
};
use url::Url;

pub fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

pub fn status(body: Value) -> Result<JobStatusPayload, StatusError> {
    JobStatusPayload::from_body(body)
}

/// Replays scripted status reads, then repeats `fallback` forever.
pub struct ScriptedApi {
    script: Mutex<VecDeque<Result<JobStatusPayload, StatusError>>>,
    fallback: Value,
    status_calls: AtomicU32,
    submitted: Mutex<Vec<(Url, Url)>>,
    submit_result: Result<JobId, SubmitError>,
}

impl ScriptedApi {
    pub fn new(script: Vec<Result<JobStatusPayload, StatusError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: json!({"status": "IN_PROGRESS"}),
            status_calls: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
            submit_result: Ok("job-42".to_string()),
        }
    }

    pub fn in_flight_forever() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_submit_result(mut self, result: Result<JobId, SubmitError>) -> Self {
        self.submit_result = result;
        self
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(Url, Url)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SwapApi for ScriptedApi {
    async fn submit(&self, source: &Url, target: &Url) -> Result<JobId, SubmitError> {
        self.submitted
            .lock()
            .unwrap()
            .push((source.clone(), target.clone()));
        self.submit_result.clone()
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatusPayload, StatusError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| status(self.fallback.clone()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<JobProgress>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<JobProgress> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, progress: JobProgress) {
        self.events.lock().unwrap().push(progress);
    }
}

/// Hands out `https://img.example/U1`, `U2`, ... and records what it got.
#[derive(Default)]
pub struct FakeHost {
    uploads: Mutex<Vec<Bytes>>,
    fail_from: Option<usize>,
}

impl FakeHost {
    pub fn failing_from(upload_index: usize) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_from: Some(upload_index),
        }
    }

    pub fn uploads(&self) -> Vec<Bytes> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, image: Bytes) -> Result<Url, UploadError> {
        let mut uploads = self.uploads.lock().unwrap();
        if self.fail_from.is_some_and(|index| uploads.len() >= index) {
            return Err(UploadError::Rejected(503));
        }
        uploads.push(image);
        Ok(url(&format!("https://img.example/U{}", uploads.len())))
    }
}

pub struct FakeFetcher {
    result: Result<Vec<u8>, FailureKind>,
    fetched: Mutex<Vec<Url>>,
    pub calls: Arc<AtomicU32>,
}

impl FakeFetcher {
    pub fn returning(bytes: &[u8]) -> Self {
        Self::with_result(Ok(bytes.to_vec()))
    }

    pub fn failing(kind: FailureKind) -> Self {
        Self::with_result(Err(kind))
    }

    fn with_result(result: Result<Vec<u8>, FailureKind>) -> Self {
        Self {
            result,
            fetched: Mutex::new(Vec::new()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn fetched(&self) -> Vec<Url> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResultFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(url.clone());
        match &self.result {
            Ok(bytes) => Ok(FetchedImage {
                bytes: bytes.clone(),
                content_type: Some("image/png".to_string()),
                final_url: url.to_string(),
            }),
            Err(kind) => Err(FetchError {
                kind: kind.clone(),
                message: kind.to_string(),
            }),
        }
    }
}
