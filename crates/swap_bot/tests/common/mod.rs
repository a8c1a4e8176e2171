#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::{json, Value};
use swap_bot::{ChatId, EffectRunner, Envelope, Outbox, SessionHub};
use swap_core::Outbound;
use swap_engine::{
    FetchError, FetchedImage, ImageHost, JobId, JobStatusPayload, PollSettings, ResultFetcher,
    StatusError, SubmitError, SwapApi, SwapEngine, UploadError,
};
use tokio::sync::mpsc;
use url::Url;

pub const CHAT: &str = "local";

pub struct ScriptedApi {
    script: Mutex<VecDeque<Value>>,
    status_calls: AtomicU32,
}

impl ScriptedApi {
    pub fn new(script: Vec<Value>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SwapApi for ScriptedApi {
    async fn submit(&self, _source: &Url, _target: &Url) -> Result<JobId, SubmitError> {
        Ok("job-42".to_string())
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatusPayload, StatusError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({"status": "IN_PROGRESS"}));
        JobStatusPayload::from_body(body)
    }
}

#[derive(Default)]
pub struct FakeHost {
    uploads: AtomicU32,
    panics: bool,
}

impl FakeHost {
    pub fn panicking() -> Self {
        Self {
            uploads: AtomicU32::new(0),
            panics: true,
        }
    }
}

#[async_trait::async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, _image: Bytes) -> Result<Url, UploadError> {
        if self.panics {
            panic!("image host exploded");
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Url::parse(&format!("https://img.example/U{n}")).unwrap())
    }
}

pub struct FakeFetcher(pub Vec<u8>);

#[async_trait::async_trait]
impl ResultFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        Ok(FetchedImage {
            bytes: self.0.clone(),
            content_type: Some("image/png".to_string()),
            final_url: url.to_string(),
        })
    }
}

#[derive(Default)]
pub struct RecordingOutbox {
    sent: Mutex<Vec<(ChatId, Outbound)>>,
}

impl RecordingOutbox {
    pub fn take(&self) -> Vec<(ChatId, Outbound)> {
        self.sent.lock().unwrap().drain(..).collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|(_, message)| match message {
                Outbound::Text(text) => Some(text),
                Outbound::Image { .. } => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Outbox for RecordingOutbox {
    async fn deliver(&self, chat: &str, message: Outbound) {
        self.sent.lock().unwrap().push((chat.to_string(), message));
    }
}

pub struct Harness {
    pub hub: SessionHub,
    pub events: mpsc::UnboundedReceiver<Envelope>,
    pub outbox: Arc<RecordingOutbox>,
    pub api: Arc<ScriptedApi>,
}

impl Harness {
    pub fn new(host: FakeHost, api: ScriptedApi) -> Self {
        swap_logging::initialize_for_tests();
        let api = Arc::new(api);
        let outbox = Arc::new(RecordingOutbox::default());
        let engine = SwapEngine::from_parts(
            Arc::new(host),
            api.clone(),
            Arc::new(FakeFetcher(b"SWAPPED".to_vec())),
            PollSettings::default(),
            Arc::new(|| "2026-10-16T10:00:00Z".to_string()),
        );
        let (tx, events) = mpsc::unbounded_channel();
        let hub = SessionHub::new(EffectRunner::new(engine, outbox.clone(), tx));
        Self {
            hub,
            events,
            outbox,
            api,
        }
    }

    pub async fn send(&mut self, chat: &str, msg: swap_core::Msg) {
        self.hub.dispatch(Envelope::new(chat, msg)).await;
    }

    /// Waits for the next effect result and feeds it back into the hub.
    pub async fn pump(&mut self) -> Envelope {
        let envelope = tokio::time::timeout(Duration::from_secs(600), self.events.recv())
            .await
            .expect("no effect result within 600s")
            .expect("event channel closed");
        self.hub.dispatch(envelope.clone()).await;
        envelope
    }
}
