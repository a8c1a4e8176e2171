//! Swap bot: session routing, effect execution and the console front end.
mod platform;

pub use platform::app::run;
pub use platform::config::{load_config, BotConfig, DEFAULT_CONFIG_PATH};
pub use platform::console::{parse_line, ConsoleInput, ConsoleOutbox};
pub use platform::effects::{map_outcome, EffectRunner};
pub use platform::hub::{text_to_msg, ChatId, Envelope, Outbox, SessionHub};
pub use platform::logging::LogDestination;
