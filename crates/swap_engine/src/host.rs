use std::time::Duration;

use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use swap_logging::swap_info;
use url::Url;

/// Multipart field carrying the image, as imgbb-style hosts expect.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone)]
pub struct HostSettings {
    pub upload_url: String,
    pub api_key: Option<String>,
    /// How long the hosted URL must stay fetchable. Independent of the job deadline.
    pub expiry: Duration,
    pub max_bytes: u64,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            upload_url: "https://api.imgbb.com/1/upload".to_string(),
            api_key: None,
            expiry: Duration::from_secs(15 * 60),
            max_bytes: 10 * 1024 * 1024,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("the image is empty")]
    Empty,
    #[error("the image is {actual} bytes but at most {max_bytes} bytes are accepted")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("image host unreachable: {0}")]
    Unreachable(String),
    #[error("image host rejected the upload (http {0})")]
    Rejected(u16),
    #[error("image host returned no usable url: {0}")]
    BadResponse(String),
}

/// Turns raw image bytes into a publicly fetchable, time-limited URL.
#[async_trait::async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: Bytes) -> Result<Url, UploadError>;
}

/// Size checks run before any network I/O so oversized photos get a readable error.
pub fn check_upload_size(image: &[u8], max_bytes: u64) -> Result<(), UploadError> {
    let actual = image.len() as u64;
    if actual == 0 {
        return Err(UploadError::Empty);
    }
    if actual > max_bytes {
        return Err(UploadError::TooLarge { max_bytes, actual });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HostResponse {
    url: Option<String>,
    data: Option<HostData>,
}

#[derive(Debug, Deserialize)]
struct HostData {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpImageHost {
    settings: HostSettings,
    client: reqwest::Client,
}

impl HttpImageHost {
    pub fn new(settings: HostSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn upload_endpoint(&self) -> Result<Url, UploadError> {
        let mut url = Url::parse(&self.settings.upload_url)
            .map_err(|err| UploadError::Unreachable(format!("bad upload url: {err}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expiration", &self.settings.expiry.as_secs().to_string());
            if let Some(key) = &self.settings.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, image: Bytes) -> Result<Url, UploadError> {
        check_upload_size(&image, self.settings.max_bytes)?;
        let size = image.len();

        let form = Form::new().part(IMAGE_FIELD, Part::bytes(image.to_vec()).file_name("image"));
        let response = self
            .client
            .post(self.upload_endpoint()?.as_str())
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::Unreachable(err.to_string()))?;
        let parsed: HostResponse =
            serde_json::from_slice(&body).map_err(|err| UploadError::BadResponse(err.to_string()))?;

        let raw = parsed
            .url
            .or_else(|| parsed.data.and_then(|data| data.url))
            .ok_or_else(|| UploadError::BadResponse("response has no url".into()))?;
        let url = Url::parse(&raw).map_err(|err| UploadError::BadResponse(format!("{raw}: {err}")))?;
        swap_info!("Hosted {} byte image at {}", size, url);
        Ok(url)
    }
}
