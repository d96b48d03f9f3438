//! Interactive command handler.
//!
//! Each stdin line is spoken. Lines that arrive while the avatar is speaking
//! are ignored, not queued. `/stop` cancels speech and `/quit` exits. At end
//! of input the current utterance is allowed to finish.

use std::io;

use anyhow::Result;
use lipsync_core::AvatarEvent;
use lipsync_voice::{AvatarSession, SpeakOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{describe_ignore, report_event};
use crate::bootstrap::CliContext;
use crate::presentation::{FrameRenderer, RenderMode};

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Say(&'a str),
    Stop,
    Quit,
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/stop" => Input::Stop,
        "/quit" | "/exit" => Input::Quit,
        text => Input::Say(text),
    }
}

/// Whether `event` means nothing is pending or playing any more.
const fn is_terminal(event: &AvatarEvent) -> bool {
    matches!(
        event,
        AvatarEvent::SpeechEnded { .. }
            | AvatarEvent::SpeechFailed { .. }
            | AvatarEvent::SpeechCancelled { .. }
    )
}

/// Execute the interactive command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let (engine, mut events) = ctx.engine()?;
    let session = AvatarSession::with_text(engine, "");
    let mut frames = session.watch_frames();
    let mut renderer = FrameRenderer::new(RenderMode::Lines);
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("Type a line to speak it. /stop stops speaking, /quit exits.");

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    if session.engine().controller().current_utterance().is_none() {
                        break;
                    }
                    continue;
                };
                match parse_input(&line) {
                    Input::Blank => {}
                    Input::Quit => break,
                    Input::Stop => session.request_stop(),
                    Input::Say(text) => {
                        if !session.set_text(text) {
                            println!("(still speaking, ignored)");
                            continue;
                        }
                        match session.request_speak() {
                            SpeakOutcome::Submitted(id) => {
                                tracing::debug!(utterance_id = %id, "Line submitted");
                            }
                            SpeakOutcome::Ignored(reason) => {
                                println!("({}, ignored)", describe_ignore(reason));
                            }
                            SpeakOutcome::Failed { error, .. } => {
                                eprintln!("Speech failed: {error}");
                            }
                        }
                    }
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = session.view();
                renderer.draw(&mut stdout, view.frame, view.is_speaking)?;
            }
            Some(event) = events.recv() => {
                report_event(&event);
                if !stdin_open
                    && is_terminal(&event)
                    && session.engine().controller().current_utterance().is_none()
                {
                    break;
                }
            }
        }
    }

    session.request_stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_input("/stop"), Input::Stop);
        assert_eq!(parse_input("  /quit "), Input::Quit);
        assert_eq!(parse_input("   "), Input::Blank);
        assert_eq!(parse_input(" Hello there "), Input::Say("Hello there"));
    }

    #[test]
    fn only_completion_events_are_terminal() {
        let id = lipsync_core::UtteranceId::allocate();
        assert!(is_terminal(&AvatarEvent::SpeechEnded { utterance_id: id }));
        assert!(!is_terminal(&AvatarEvent::SpeechStarted { utterance_id: id }));
        assert!(!is_terminal(&AvatarEvent::VoicesChanged { count: 2 }));
    }
}
