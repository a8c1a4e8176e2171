use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use swap_logging::{swap_debug, swap_info};
use url::Url;

use crate::{JobId, JobStatusPayload};

const API_KEY_HEADER: &str = "x-magicapi-key";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base of the face swap API; `/faceswap/image/run` etc. are appended.
    pub base_url: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.magicapi.dev/api/v1/magicapi/faceswap-v2".to_string(),
            api_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("api key rejected (http {0})")]
    Unauthorized(u16),
    #[error("swap service unreachable: {0}")]
    Unreachable(String),
    #[error("swap service rejected the request: {0}")]
    InvalidPayload(String),
    #[error("unexpected response from swap service: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("api key rejected (http {0})")]
    Unauthorized(u16),
    #[error("swap service unreachable: {0}")]
    Unreachable(String),
    #[error("status request failed with http {0}")]
    HttpStatus(u16),
    #[error("undecodable status response: {0}")]
    Decode(String),
}

/// Remote job API: submission and single status reads. Never retries.
#[async_trait::async_trait]
pub trait SwapApi: Send + Sync {
    async fn submit(&self, source: &Url, target: &Url) -> Result<JobId, SubmitError>;

    async fn status(&self, job_id: &str) -> Result<JobStatusPayload, StatusError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HttpSwapClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl HttpSwapClient {
    pub fn new(settings: ClientSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl SwapApi for HttpSwapClient {
    async fn submit(&self, source: &Url, target: &Url) -> Result<JobId, SubmitError> {
        let body = json!({
            "input": {
                "swap_image": source.as_str(),
                "target_image": target.as_str(),
            }
        });
        let body =
            serde_json::to_vec(&body).map_err(|err| SubmitError::InvalidPayload(err.to_string()))?;

        let response = self
            .client
            .post(self.endpoint("faceswap/image/run"))
            .header(API_KEY_HEADER, &self.settings.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| SubmitError::Unreachable(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SubmitError::Unreachable(err.to_string()))?;
        if !status.is_success() {
            return Err(map_submit_status(status, &String::from_utf8_lossy(&bytes)));
        }

        let parsed: SubmitResponse = serde_json::from_slice(&bytes)
            .map_err(|err| SubmitError::Unknown(format!("invalid json: {err}")))?;
        let job_id = match parsed.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(SubmitError::Unknown("response carried no job id".into())),
        };
        swap_info!("Submitted swap job {}", job_id);
        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusPayload, StatusError> {
        let response = self
            .client
            .get(self.endpoint(&format!("faceswap/image/status/{job_id}")))
            .header(API_KEY_HEADER, &self.settings.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| StatusError::Unreachable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StatusError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(StatusError::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| StatusError::Unreachable(err.to_string()))?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|err| StatusError::Decode(err.to_string()))?;
        let payload = JobStatusPayload::from_body(body)?;
        swap_debug!("Job {} status {}", job_id, payload.status_raw);
        Ok(payload)
    }
}

fn map_submit_status(status: StatusCode, body: &str) -> SubmitError {
    match status.as_u16() {
        401 | 403 => SubmitError::Unauthorized(status.as_u16()),
        400 | 422 => SubmitError::InvalidPayload(format!("http {}: {}", status.as_u16(), body)),
        404 => SubmitError::Unreachable(format!("endpoint not found (http {})", status.as_u16())),
        code => SubmitError::Unknown(format!("http {code}: {body}")),
    }
}
