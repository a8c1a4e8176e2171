use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use swap_core::{Msg, Outbound, Photo};
use swap_logging::{swap_error, swap_info, swap_warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::hub::{text_to_msg, ChatId, Envelope, Outbox};

pub const DEFAULT_CHAT: &str = "local";

/// One line typed on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Text(String),
    Photo(PathBuf),
}

/// Parses `[@chat] text` or `[@chat] /photo <path>`. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<(ChatId, ConsoleInput)> {
    let line = line.trim();
    let (chat, rest) = match line.strip_prefix('@') {
        Some(tagged) => {
            let (chat, rest) = tagged.split_once(char::is_whitespace).unwrap_or((tagged, ""));
            (chat.to_string(), rest.trim())
        }
        None => (DEFAULT_CHAT.to_string(), line),
    };
    if chat.is_empty() || rest.is_empty() {
        return None;
    }

    let input = match rest.strip_prefix("/photo") {
        Some(path) if path.is_empty() || path.starts_with(char::is_whitespace) => {
            let path = path.trim();
            if path.is_empty() {
                return None;
            }
            ConsoleInput::Photo(PathBuf::from(path))
        }
        _ => ConsoleInput::Text(rest.to_string()),
    };
    Some((chat, input))
}

/// Prints replies to stdout and writes delivered images under `output_dir`.
pub struct ConsoleOutbox {
    output_dir: PathBuf,
    counter: AtomicU64,
}

impl ConsoleOutbox {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn save_image(&self, chat: &str, image: &Photo) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.output_dir.join(format!("{chat}-{n}.png"));
        tokio::fs::write(&path, image.as_bytes()).await?;
        Ok(path)
    }

    async fn print(&self, chat: &str, text: &str) {
        let mut stdout = tokio::io::stdout();
        let line = format!("[{chat}] {text}\n");
        if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            swap_warn!(chat = chat; "stdout closed; reply dropped");
        }
    }
}

#[async_trait::async_trait]
impl Outbox for ConsoleOutbox {
    async fn deliver(&self, chat: &str, message: Outbound) {
        match message {
            Outbound::Text(text) => self.print(chat, &text).await,
            Outbound::Image { image, caption } => match self.save_image(chat, &image).await {
                Ok(path) => {
                    swap_info!(chat = chat; "Saved result image to {}", path.display());
                    self.print(chat, &format!("{caption} [image: {}]", path.display()))
                        .await;
                }
                Err(err) => {
                    swap_error!(chat = chat; "Could not save result image: {}", err);
                    self.print(chat, &format!("{caption} [image could not be saved: {err}]"))
                        .await;
                }
            },
        }
    }
}

/// Reads stdin until EOF or `shutdown`, forwarding each line to the hub.
pub async fn run_console(events: mpsc::UnboundedSender<Envelope>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                swap_error!("Reading stdin failed: {}", err);
                break;
            }
        };
        let Some((chat, input)) = parse_line(&line) else {
            continue;
        };
        let msg = match input {
            ConsoleInput::Text(text) => text_to_msg(&text),
            ConsoleInput::Photo(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => Msg::PhotoReceived(Photo::new(bytes)),
                Err(err) => {
                    swap_warn!(chat = chat; "Cannot read photo {}: {}", path.display(), err);
                    continue;
                }
            },
        };
        if events.send(Envelope::new(chat, msg)).is_err() {
            break;
        }
    }
}
