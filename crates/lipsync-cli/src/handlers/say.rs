//! Say command handler.
//!
//! Speaks one piece of text and animates the avatar until the utterance
//! ends, fails, hits `--stop-after`, or Ctrl-C is pressed.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use lipsync_core::{AvatarEvent, UtteranceId};
use lipsync_voice::{AvatarSession, IgnoreReason, SpeakOutcome};

use super::{describe_ignore, report_event};
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::FrameRenderer;

/// How the utterance finished.
#[derive(Debug, PartialEq, Eq)]
enum Finish {
    Ended,
    Stopped,
    Interrupted,
    Failed(String),
}

/// Whether `event` ends the utterance `id`.
fn finish_for(event: &AvatarEvent, id: UtteranceId) -> Option<Finish> {
    match event {
        AvatarEvent::SpeechEnded { utterance_id } if *utterance_id == id => Some(Finish::Ended),
        AvatarEvent::SpeechFailed {
            utterance_id,
            error,
        } if *utterance_id == id => Some(Finish::Failed(error.clone())),
        AvatarEvent::SpeechCancelled {
            utterance_id: Some(utterance_id),
        } if *utterance_id == id => Some(Finish::Stopped),
        _ => None,
    }
}

fn draw<W: Write>(
    renderer: &mut FrameRenderer,
    out: &mut W,
    session: &AvatarSession,
) -> io::Result<()> {
    let view = session.view();
    renderer.draw(out, view.frame, view.is_speaking)
}

/// Execute the say command.
pub async fn execute(ctx: &CliContext, text: &str, stop_after: Option<Duration>) -> Result<()> {
    let (engine, mut events) = ctx.engine()?;
    let session = AvatarSession::with_text(engine, text);
    let mut frames = session.watch_frames();
    let mut speaking = session.engine().watch_speaking();

    let id = match session.request_speak() {
        SpeakOutcome::Submitted(id) => id,
        SpeakOutcome::Ignored(reason @ IgnoreReason::EmptyText) => {
            return Err(CliError::Arguments(describe_ignore(reason).to_string()).into());
        }
        SpeakOutcome::Ignored(reason) => {
            return Err(CliError::Engine(describe_ignore(reason).to_string()).into());
        }
        SpeakOutcome::Failed { error, .. } => return Err(CliError::Backend(error).into()),
    };
    tracing::info!(utterance_id = %id, backend = %ctx.backend, "Speaking");

    let mut renderer = FrameRenderer::for_stdout();
    let mut stdout = io::stdout();
    draw(&mut renderer, &mut stdout, &session)?;

    let stop_timer = async move {
        match stop_after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop_timer);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let finish = loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                session.request_stop();
                break Finish::Interrupted;
            }
            () = &mut stop_timer => {
                session.request_stop();
                break Finish::Stopped;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break Finish::Stopped;
                }
                draw(&mut renderer, &mut stdout, &session)?;
            }
            changed = speaking.changed() => {
                if changed.is_err() {
                    break Finish::Stopped;
                }
                draw(&mut renderer, &mut stdout, &session)?;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break Finish::Stopped;
                };
                report_event(&event);
                if let Some(finish) = finish_for(&event, id) {
                    break finish;
                }
            }
        }
    };

    draw(&mut renderer, &mut stdout, &session)?;
    tracing::info!(utterance_id = %id, outcome = ?finish, "Done");

    match finish {
        Finish::Ended | Finish::Stopped => Ok(()),
        Finish::Interrupted => {
            println!("Interrupted.");
            Ok(())
        }
        Finish::Failed(error) => Err(CliError::Backend(error).into()),
    }
}
