use std::collections::HashMap;

use swap_core::{parse_command, update, JobResult, Msg, Outbound, Session, Stage};
use swap_logging::{swap_debug, swap_error, swap_info, swap_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::effects::EffectRunner;

pub type ChatId = String;

/// A message addressed to one chat's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub chat: ChatId,
    pub msg: Msg,
}

impl Envelope {
    pub fn new(chat: impl Into<ChatId>, msg: Msg) -> Self {
        Self {
            chat: chat.into(),
            msg,
        }
    }
}

/// Outbound side of the messaging collaborator.
#[async_trait::async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, chat: &str, message: Outbound);
}

pub fn text_to_msg(text: &str) -> Msg {
    match parse_command(text) {
        Some(command) => Msg::Command(command),
        None => Msg::Text(text.trim().to_string()),
    }
}

/// Owns every chat's session and applies events to them one at a time.
///
/// Sessions never share state, so a failure in one chat only ever resets
/// that chat. Sessions are kept after going idle so late results from an
/// abandoned attempt can still be recognised as stale.
pub struct SessionHub {
    sessions: HashMap<ChatId, Session>,
    runner: EffectRunner,
}

impl SessionHub {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            sessions: HashMap::new(),
            runner,
        }
    }

    pub fn session(&self, chat: &str) -> Option<&Session> {
        self.sessions.get(chat)
    }

    pub async fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { chat, msg } = envelope;
        if let Msg::JobFinished { job_id, .. } = &msg {
            self.runner.release(job_id);
        }
        log_failure(&chat, &msg);

        let session = self.sessions.remove(&chat).unwrap_or_default();
        let before = session.stage();
        let (session, effects) = update(session, msg);
        if session.stage() != before {
            swap_debug!(chat = chat; "{:?} -> {:?}", before, session.stage());
        }
        if before != Stage::Idle && session.stage() == Stage::Idle {
            swap_info!(chat = chat; "Exchange ended; scratch state cleared");
        }
        self.sessions.insert(chat.clone(), session);

        self.runner.run(&chat, effects).await;
    }

    /// Processes events until `shutdown` fires or every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Envelope>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                envelope = events.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => break,
                },
            }
        }
        self.runner.cancel_all();
        swap_info!("Session hub stopped with {} known chats", self.sessions.len());
    }
}

fn log_failure(chat: &str, msg: &Msg) {
    match msg {
        Msg::SourceUploaded {
            result: Err(reason),
            ..
        } => swap_warn!(chat = chat; "Source upload failed: {}", reason),
        Msg::JobSubmitted {
            result: Err(reason),
            ..
        } => swap_warn!(chat = chat; "Job could not be started: {}", reason),
        Msg::JobFinished { job_id, result } => match result {
            JobResult::Delivered { .. } => {}
            JobResult::FetchFailed { url, reason } => {
                swap_warn!(chat = chat; "Job {} result at {} not downloadable: {}", job_id, url, reason)
            }
            JobResult::Malformed { dump } => {
                swap_warn!(chat = chat; "Job {} returned no usable result: {}", job_id, dump)
            }
            JobResult::Failed { reason } => swap_warn!(chat = chat; "Job {} failed: {}", job_id, reason),
            JobResult::TimedOut { waited_secs } => {
                swap_warn!(chat = chat; "Job {} timed out after {}s", job_id, waited_secs)
            }
        },
        Msg::UnexpectedFailure { attempt, detail } => {
            swap_error!(chat = chat; "Attempt {} aborted: {}", attempt, detail)
        }
        _ => {}
    }
}
