#![deny(missing_docs)]
//! Shared logging utilities for the swap bot workspace.
//!
//! This crate provides the `swap_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.
//!
//! Every macro accepts an optional `chat = <id>;` prefix which tags the line
//! with the conversation it belongs to:
//!
//! ```
//! swap_logging::swap_info!(chat = "alice"; "source uploaded in {} ms", 42);
//! swap_logging::swap_warn!("no chat context here");
//! ```

#[doc(hidden)]
pub use log;

#[doc(hidden)]
#[macro_export]
macro_rules! __swap_log {
    ($level:expr, chat = $chat:expr; $($arg:tt)+) => {{
        $crate::log::log!($level, "[chat {}] {}", $chat, format_args!($($arg)+));
    }};
    ($level:expr, $($arg:tt)+) => {{
        $crate::log::log!($level, $($arg)+);
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! swap_trace {
    ($($arg:tt)+) => {
        $crate::__swap_log!($crate::log::Level::Trace, $($arg)+)
    };
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! swap_debug {
    ($($arg:tt)+) => {
        $crate::__swap_log!($crate::log::Level::Debug, $($arg)+)
    };
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! swap_info {
    ($($arg:tt)+) => {
        $crate::__swap_log!($crate::log::Level::Info, $($arg)+)
    };
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! swap_warn {
    ($($arg:tt)+) => {
        $crate::__swap_log!($crate::log::Level::Warn, $($arg)+)
    };
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! swap_error {
    ($($arg:tt)+) => {
        $crate::__swap_log!($crate::log::Level::Error, $($arg)+)
    };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
