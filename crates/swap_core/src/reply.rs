use crate::{Session, Stage};

pub(crate) const PROMPT_SOURCE: &str =
    "👋 Let's swap some faces.\n\nFirst, please send the SOURCE image (the one with the face you want to USE).";
pub(crate) const PROMPT_TARGET: &str =
    "👍 Got it! Now, please send the TARGET image (the one you want the face put onto).";
pub(crate) const UPLOADING_SOURCE: &str = "📤 Uploading your source image...";
pub(crate) const PROCESSING: &str =
    "⏳ Processing... Please wait a moment while the magic happens!";
pub(crate) const CANCELLED: &str = "Operation cancelled. Send /start-swap to start over.";
pub(crate) const NOTHING_TO_CANCEL: &str = "Nothing to cancel. Send /start-swap to begin.";
pub(crate) const NOT_STARTED: &str = "Send /start-swap first, then the two images.";
pub(crate) const ALREADY_STARTED: &str =
    "A swap is already in progress. Send /cancel to abandon it first.";
pub(crate) const STILL_UPLOADING: &str =
    "Still handling your previous image, please wait for my reply.";
pub(crate) const HELLO: &str = "Hello! The bot is up and responding.";
pub(crate) const UNEXPECTED: &str =
    "❌ An unexpected error occurred. Please try again by sending /start-swap.";
pub(crate) const SUCCESS_CAPTION: &str = "✅ Success! Here is your swapped image.";
pub(crate) const RETRY_HINT: &str = "Send /start-swap to try again.";

pub fn help_text() -> String {
    [
        "I swap the face from one photo onto another.",
        "",
        "/start-swap - begin: send the SOURCE photo, then the TARGET photo",
        "/status - show what I am waiting for",
        "/cancel - abandon the current swap",
        "/help - show this message",
    ]
    .join("\n")
}

pub fn status_text(session: &Session) -> String {
    match session.stage() {
        Stage::Idle => "Idle. Send /start-swap to begin.".to_string(),
        Stage::AwaitingSource => "Waiting for the SOURCE image.".to_string(),
        Stage::UploadingSource => "Uploading the SOURCE image.".to_string(),
        Stage::AwaitingTarget => "Source received. Waiting for the TARGET image.".to_string(),
        Stage::Submitting => "Uploading the TARGET image and submitting the job.".to_string(),
        Stage::Running => match session.active_job() {
            Some(job) => format!(
                "Job {} is running (submitted {}).",
                job.id, job.submitted_at
            ),
            None => "A job is running.".to_string(),
        },
    }
}

/// Formats seconds as `Xm Ys`, or just `Ys` under a minute.
pub fn format_elapsed(secs: u64) -> String {
    let (minutes, seconds) = (secs / 60, secs % 60);
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

pub(crate) fn progress(job_id: &str, elapsed_secs: u64) -> String {
    format!(
        "⏳ Still working on job {job_id}... {} elapsed.",
        format_elapsed(elapsed_secs)
    )
}

pub(crate) fn rejected_while_running(job_id: Option<&str>) -> String {
    match job_id {
        Some(id) => format!("Job {id} is still running. Wait for it or send /cancel."),
        None => "A job is still running. Wait for it or send /cancel.".to_string(),
    }
}
