use url::Url;

use crate::reply;
use crate::{
    help_text, status_text, ActiveJob, AttemptId, Command, Effect, JobId, JobResult, Msg,
    Outbound, Photo, Session, Stage,
};

/// Pure update function: applies a message to a session and returns any effects.
///
/// Every path into `Stage::Idle` goes through `Session::reset`, so scratch
/// state never outlives the exchange. Async results for a stale attempt or a
/// job the session no longer watches are dropped without effects.
pub fn update(mut session: Session, msg: Msg) -> (Session, Vec<Effect>) {
    let effects = match msg {
        Msg::Command(command) => on_command(&mut session, command),
        Msg::Text(_) => vec![Effect::text(match session.stage() {
            Stage::Idle => help_text(),
            _ => status_text(&session),
        })],
        Msg::PhotoReceived(photo) => on_photo(&mut session, photo),
        Msg::SourceUploaded { attempt, result } => on_source_uploaded(&mut session, attempt, result),
        Msg::JobSubmitted {
            attempt,
            submitted_at,
            result,
        } => on_job_submitted(&mut session, attempt, submitted_at, result),
        Msg::JobProgress {
            job_id,
            elapsed_secs,
            ..
        } => {
            if session.is_watching(&job_id) {
                vec![Effect::text(reply::progress(&job_id, elapsed_secs))]
            } else {
                Vec::new()
            }
        }
        Msg::JobFinished { job_id, result } => {
            if session.is_watching(&job_id) {
                session.reset();
                vec![finished_reply(result)]
            } else {
                Vec::new()
            }
        }
        Msg::UnexpectedFailure { attempt, .. } => {
            if session.is_current(attempt) {
                let mut effects = reset_with_cancel(&mut session);
                effects.push(Effect::text(reply::UNEXPECTED));
                effects
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (session, effects)
}

fn on_command(session: &mut Session, command: Command) -> Vec<Effect> {
    match command {
        Command::StartSwap => match session.stage() {
            Stage::Idle => {
                session.begin();
                vec![Effect::text(reply::PROMPT_SOURCE)]
            }
            Stage::AwaitingSource => vec![Effect::text(reply::PROMPT_SOURCE)],
            Stage::UploadingSource | Stage::AwaitingTarget | Stage::Submitting | Stage::Running => {
                vec![Effect::text(reply::ALREADY_STARTED)]
            }
        },
        Command::Cancel => {
            if session.stage() == Stage::Idle {
                return vec![Effect::text(reply::NOTHING_TO_CANCEL)];
            }
            let mut effects = reset_with_cancel(session);
            effects.push(Effect::text(reply::CANCELLED));
            effects
        }
        Command::Help => vec![Effect::text(help_text())],
        Command::Status => vec![Effect::text(status_text(session))],
        Command::Hello => vec![Effect::text(reply::HELLO)],
    }
}

fn on_photo(session: &mut Session, photo: Photo) -> Vec<Effect> {
    match session.stage() {
        Stage::Idle => vec![Effect::text(reply::NOT_STARTED)],
        Stage::AwaitingSource => {
            session.set_stage(Stage::UploadingSource);
            vec![
                Effect::text(reply::UPLOADING_SOURCE),
                Effect::UploadSource {
                    attempt: session.attempt(),
                    photo,
                },
            ]
        }
        Stage::AwaitingTarget => {
            let Some(source) = session.source_ref().cloned() else {
                session.reset();
                return vec![Effect::text(reply::UNEXPECTED)];
            };
            session.set_stage(Stage::Submitting);
            vec![
                Effect::text(reply::PROCESSING),
                Effect::SubmitJob {
                    attempt: session.attempt(),
                    source,
                    target: photo,
                },
            ]
        }
        Stage::UploadingSource | Stage::Submitting => vec![Effect::text(reply::STILL_UPLOADING)],
        Stage::Running => vec![Effect::text(reply::rejected_while_running(
            session.active_job().map(|job| job.id.as_str()),
        ))],
    }
}

fn on_source_uploaded(
    session: &mut Session,
    attempt: AttemptId,
    result: Result<Url, String>,
) -> Vec<Effect> {
    if !session.is_current(attempt) || session.stage() != Stage::UploadingSource {
        return Vec::new();
    }
    match result {
        Ok(url) => {
            session.source_staged(url);
            vec![Effect::text(reply::PROMPT_TARGET)]
        }
        Err(reason) => {
            session.set_stage(Stage::AwaitingSource);
            vec![Effect::text(format!(
                "❌ Could not upload that image: {reason}\nPlease send the SOURCE image again."
            ))]
        }
    }
}

fn on_job_submitted(
    session: &mut Session,
    attempt: AttemptId,
    submitted_at: String,
    result: Result<JobId, String>,
) -> Vec<Effect> {
    if !session.is_current(attempt) || session.stage() != Stage::Submitting {
        return Vec::new();
    }
    match result {
        Ok(job_id) => {
            session.job_started(ActiveJob {
                id: job_id.clone(),
                submitted_at,
            });
            vec![
                Effect::text(format!(
                    "🚀 Job {job_id} submitted. I will keep you posted."
                )),
                Effect::WatchJob { attempt, job_id },
            ]
        }
        Err(reason) => {
            session.reset();
            vec![Effect::text(format!(
                "❌ Sorry, the swap could not be started: {reason}\n{}",
                reply::RETRY_HINT
            ))]
        }
    }
}

fn reset_with_cancel(session: &mut Session) -> Vec<Effect> {
    match session.reset() {
        Some(job) => vec![Effect::CancelJob { job_id: job.id }],
        None => Vec::new(),
    }
}

fn finished_reply(result: JobResult) -> Effect {
    match result {
        JobResult::Delivered { url, image } => Effect::Reply(Outbound::Image {
            image,
            caption: match url {
                Some(url) => format!("{}\n{url}", reply::SUCCESS_CAPTION),
                None => reply::SUCCESS_CAPTION.to_string(),
            },
        }),
        JobResult::FetchFailed { url, reason } => Effect::text(format!(
            "✅ The swap finished, but I could not download the result ({reason}).\nYou can open it here: {url}"
        )),
        JobResult::Malformed { dump } => Effect::text(format!(
            "❌ The swap finished but returned no usable image.\nRaw response: {dump}\n{}",
            reply::RETRY_HINT
        )),
        JobResult::Failed { reason } => Effect::text(format!(
            "❌ Sorry, the swap failed: {reason}\n{}",
            reply::RETRY_HINT
        )),
        JobResult::TimedOut { waited_secs } => Effect::text(format!(
            "⌛ The swap did not finish within {}. {}",
            crate::format_elapsed(waited_secs),
            reply::RETRY_HINT
        )),
    }
}
