use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use log::LevelFilter;
use serde::Deserialize;
use swap_engine::{ClientSettings, EngineConfig, FetchSettings, HostSettings, PollSettings};
use swap_logging::{swap_info, swap_warn};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "swapbot.ron";

/// Bot settings, read from a RON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub image_host_url: String,
    pub image_host_key: Option<String>,
    /// Validity of hosted image URLs; unrelated to `max_wait_secs`.
    pub image_expiry_secs: u64,
    pub max_upload_bytes: u64,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub progress_every: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub result_max_bytes: u64,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let host = HostSettings::default();
        let poll = PollSettings::default();
        Self {
            api_base_url: client.base_url,
            api_key: String::new(),
            image_host_url: host.upload_url,
            image_host_key: None,
            image_expiry_secs: host.expiry.as_secs(),
            max_upload_bytes: host.max_bytes,
            poll_interval_secs: poll.interval.as_secs(),
            max_wait_secs: poll.max_wait.as_secs(),
            progress_every: poll.progress_every,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            result_max_bytes: FetchSettings::default().max_bytes,
            output_dir: PathBuf::from("output"),
            log_level: "info".to_string(),
            log_destination: LogDestination::Terminal,
            log_file: PathBuf::from("swapbot.log"),
        }
    }
}

impl BotConfig {
    /// Secrets from the environment win over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("FACESWAP_API_KEY").filter(|key| !key.is_empty()) {
            self.api_key = key;
        }
        if let Some(key) = lookup("IMAGE_HOST_API_KEY").filter(|key| !key.is_empty()) {
            self.image_host_key = Some(key);
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            swap_warn!("Unknown log level {:?}; using info", self.log_level);
            LevelFilter::Info
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        let connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        let request_timeout = Duration::from_secs(self.request_timeout_secs);
        EngineConfig {
            client: ClientSettings {
                base_url: self.api_base_url.clone(),
                api_key: self.api_key.clone(),
                connect_timeout,
                request_timeout,
            },
            host: HostSettings {
                upload_url: self.image_host_url.clone(),
                api_key: self.image_host_key.clone(),
                expiry: Duration::from_secs(self.image_expiry_secs),
                max_bytes: self.max_upload_bytes,
                connect_timeout,
                request_timeout,
            },
            poll: PollSettings {
                interval: Duration::from_secs(self.poll_interval_secs),
                max_wait: Duration::from_secs(self.max_wait_secs),
                progress_every: self.progress_every,
            },
            fetch: FetchSettings {
                connect_timeout,
                request_timeout,
                max_bytes: self.result_max_bytes,
                ..FetchSettings::default()
            },
            now_utc: Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Loads `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<BotConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            swap_info!("No config at {:?}; using defaults", path);
            return Ok(BotConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };

    let config: BotConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    swap_info!("Loaded config from {:?}", path);
    Ok(config)
}
