//! Swap core: pure per-chat session state machine and reply texts.
mod command;
mod effect;
mod msg;
mod reply;
mod state;
mod update;

pub use command::{parse_command, Command};
pub use effect::{Effect, Outbound};
pub use msg::{JobResult, Msg};
pub use reply::{format_elapsed, help_text, status_text};
pub use state::{ActiveJob, AttemptId, JobId, Photo, Session, Stage};
pub use update::update;
