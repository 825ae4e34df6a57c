//! Read-eval loop mapping terminal input onto controller operations.

use std::collections::VecDeque;
use std::sync::Arc;

use storyloom_core::error::StoryError;
use storyloom_core::presenter::Presenter;
use storyloom_story::application::controller::{TurnController, TurnOutcome};
use storyloom_story::domain::parameters::SessionSetup;
use tokio::io::{AsyncBufRead, Lines};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::CliError;

const HELP: &str =
    "Type a choice letter or your own action. Commands: /undo, /restart, /retry, /quit.";

/// One line of reader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free-form or lettered choice.
    Choice(String),
    /// Rewind the last turn.
    Undo,
    /// Start over with the same setup.
    Restart,
    /// Re-issue a failed request.
    Retry,
    /// Show the command list.
    Help,
    /// Leave the program.
    Quit,
    /// A slash command that does not exist.
    Unknown(String),
}

impl Command {
    /// Parses one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Self::Choice(trimmed.to_owned());
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "/undo" => Self::Undo,
            "/restart" => Self::Restart,
            "/retry" => Self::Retry,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Unknown(trimmed.to_owned()),
        }
    }
}

/// Asks for any setup value `setup` is missing, one line per value.
///
/// EOF leaves the remaining values unset so the controller reports them.
///
/// # Errors
///
/// Returns `CliError::Io` if reading input fails.
pub async fn complete_setup<R>(
    mut setup: SessionSetup,
    lines: &mut Lines<R>,
    presenter: &dyn Presenter,
) -> Result<SessionSetup, CliError>
where
    R: AsyncBufRead + Unpin,
{
    for (label, slot) in [
        ("Genre (e.g. fantasy, mystery)", &mut setup.genre),
        ("Main character (e.g. a lost knight)", &mut setup.character),
        ("Writing style (e.g. whimsical, noir)", &mut setup.style),
    ] {
        if slot.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            continue;
        }
        presenter.on_notice(&format!("{label}:")).await;
        *slot = lines.next_line().await?;
    }
    Ok(setup)
}

type TurnResult = (&'static str, Result<TurnOutcome, StoryError>);

/// Starts the story and processes input lines until `/quit` or EOF.
///
/// Generating turns run as tasks so input keeps being read while a request
/// is outstanding. `/restart` takes effect immediately and drops any input
/// queued behind the abandoned turn; everything else waits until no turn is
/// running. At EOF the remaining turns and queued input are still processed.
///
/// Controller failures have already been shown by the presenter, so they
/// are only logged here.
///
/// # Errors
///
/// Returns `CliError::Io` if reading input fails.
pub async fn run<R>(
    controller: Arc<TurnController>,
    setup: SessionSetup,
    lines: &mut Lines<R>,
    presenter: &dyn Presenter,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut turns: JoinSet<TurnResult> = JoinSet::new();
    let mut queued: VecDeque<Command> = VecDeque::new();
    let mut input_open = true;

    let opener = Arc::clone(&controller);
    turns.spawn(async move { ("start", opener.start_story(setup).await) });

    loop {
        if turns.is_empty() {
            if let Some(command) = queued.pop_front() {
                if dispatch(&controller, command, &mut turns, presenter).await == Flow::Quit {
                    break;
                }
                continue;
            }
            if !input_open {
                break;
            }
        }

        tokio::select! {
            biased;
            Some(joined) = turns.join_next() => match joined {
                Ok((operation, result)) => log_outcome(operation, result),
                Err(err) => warn!(error = %err, "turn task did not complete"),
            },
            line = lines.next_line(), if input_open => match line? {
                None => input_open = false,
                Some(line) => {
                    let command = Command::parse(&line);
                    if command == Command::Restart {
                        queued.clear();
                        dispatch(&controller, command, &mut turns, presenter).await;
                    } else if turns.is_empty() {
                        if dispatch(&controller, command, &mut turns, presenter).await == Flow::Quit {
                            break;
                        }
                    } else {
                        queued.push_back(command);
                    }
                }
            },
            else => break,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn dispatch(
    controller: &Arc<TurnController>,
    command: Command,
    turns: &mut JoinSet<TurnResult>,
    presenter: &dyn Presenter,
) -> Flow {
    let controller = Arc::clone(controller);
    match command {
        Command::Choice(text) => {
            turns.spawn(async move { ("choice", controller.submit_choice(&text).await) });
        }
        Command::Restart => {
            turns.spawn(async move { ("restart", controller.restart().await) });
        }
        Command::Retry => {
            turns.spawn(async move { ("retry", controller.retry().await) });
        }
        Command::Undo => {
            if let Err(err) = controller.undo().await {
                debug!(error = %err, "undo refused");
            }
        }
        Command::Help => presenter.on_notice(HELP).await,
        Command::Quit => return Flow::Quit,
        Command::Unknown(cmd) => {
            presenter
                .on_notice(&format!("Unknown command {cmd}. {HELP}"))
                .await;
        }
    }
    Flow::Continue
}

fn log_outcome(operation: &str, result: Result<TurnOutcome, StoryError>) {
    match result {
        Ok(TurnOutcome::Segment(segment)) => {
            debug!(
                operation,
                ended = segment.ended,
                choices = segment.choices.len(),
                "turn complete"
            );
        }
        Ok(outcome) => debug!(operation, ?outcome, "turn produced no segment"),
        Err(err) => debug!(operation, error = %err, "turn refused or failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use storyloom_core::turn::Turn;
    use storyloom_story::application::controller::TurnState;
    use storyloom_test_support::{
        GatedGateway, PresenterEvent, RecordingPresenter, ScriptedGateway,
    };
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    const OPENING: &str = "The Gate\n\nA gate looms.\n\nA) Enter\nB) Leave\nC) Wait\nD) Shout";

    fn full_setup() -> SessionSetup {
        SessionSetup {
            genre: Some("fantasy".into()),
            character: Some("a lost knight".into()),
            style: Some("whimsical".into()),
        }
    }

    #[test]
    fn test_parse_recognises_commands() {
        assert_eq!(Command::parse(" /undo "), Command::Undo);
        assert_eq!(Command::parse("/RESTART"), Command::Restart);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".into()));
        assert_eq!(Command::parse("  B  "), Command::Choice("B".into()));
    }

    #[tokio::test]
    async fn test_input_drives_choice_then_undo() {
        // Arrange
        let gateway = Arc::new(ScriptedGateway::replying(&[
            OPENING,
            "You enter.\n\nA) x\nB) y\nC) z\nD) w",
        ]));
        let presenter = Arc::new(RecordingPresenter::new());
        let controller = Arc::new(TurnController::new(gateway.clone(), presenter.clone()));
        let mut lines = BufReader::new(&b"A\n/undo\n/quit\nB\n"[..]).lines();

        // Act
        run(controller.clone(), full_setup(), &mut lines, presenter.as_ref())
            .await
            .unwrap();

        // Assert
        assert_eq!(gateway.requests().len(), 2);
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.state(), TurnState::Ready);
    }

    #[tokio::test]
    async fn test_unknown_command_shows_help() {
        let gateway = Arc::new(ScriptedGateway::replying(&[OPENING]));
        let presenter = Arc::new(RecordingPresenter::new());
        let controller = Arc::new(TurnController::new(gateway, presenter.clone()));
        let mut lines = BufReader::new(&b"/dance\n"[..]).lines();

        run(controller.clone(), full_setup(), &mut lines, presenter.as_ref())
            .await
            .unwrap();

        let unknown = presenter.count(
            |e| matches!(e, PresenterEvent::Notice(m) if m.contains("Unknown command /dance")),
        );
        assert_eq!(unknown, 1);
    }

    #[tokio::test]
    async fn test_restart_interrupts_outstanding_choice() {
        // Arrange
        let fresh = "The Other Gate\n\nA second gate.\n\nA) Knock\nB) Climb\nC) Dig\nD) Sing";
        let gateway = Arc::new(GatedGateway::replying(&[
            OPENING,
            "You enter.\n\nThis reply arrives after the restart.\n\nA) x\nB) y\nC) z\nD) w",
            fresh,
        ]));
        gateway.release(1);
        let presenter = Arc::new(RecordingPresenter::new());
        let controller = Arc::new(TurnController::new(gateway.clone(), presenter.clone()));
        let (mut writer, reader) = tokio::io::duplex(256);
        let mut lines = BufReader::new(reader).lines();

        let gate = gateway.clone();
        let reader_input = async move {
            writer.write_all(b"A\n").await.unwrap();
            gate.wait_for_calls(2).await;
            writer.write_all(b"/restart\n").await.unwrap();
            gate.wait_for_calls(3).await;
            gate.release(2);
            drop(writer);
        };

        // Act
        let (result, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async {
                tokio::join!(
                    run(controller.clone(), full_setup(), &mut lines, presenter.as_ref()),
                    reader_input,
                )
            },
        )
        .await
        .expect("restart waited for the outstanding choice");

        // Assert
        result.unwrap();
        let requests = gateway.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].history.is_empty());
        let history = controller.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], Turn::model(fresh));
        assert_eq!(controller.state(), TurnState::Ready);
        assert_eq!(
            presenter.count(|e| matches!(e, PresenterEvent::Restarted)),
            1
        );
    }

    #[tokio::test]
    async fn test_complete_setup_reads_only_missing_values() {
        // Arrange
        let presenter = RecordingPresenter::new();
        let mut lines = BufReader::new(&b"noir\n"[..]).lines();
        let partial = SessionSetup {
            genre: Some("mystery".into()),
            character: Some("a detective".into()),
            style: None,
        };

        // Act
        let setup = complete_setup(partial, &mut lines, &presenter).await.unwrap();

        // Assert
        assert_eq!(setup.genre.as_deref(), Some("mystery"));
        assert_eq!(setup.style.as_deref(), Some("noir"));
        assert_eq!(presenter.count(|e| matches!(e, PresenterEvent::Notice(_))), 1);
    }

    #[tokio::test]
    async fn test_complete_setup_leaves_values_unset_at_eof() {
        let presenter = RecordingPresenter::new();
        let mut lines = BufReader::new(&b""[..]).lines();

        let setup = complete_setup(SessionSetup::default(), &mut lines, &presenter)
            .await
            .unwrap();

        assert!(setup.genre.is_none());
        assert!(setup.character.is_none());
        assert!(setup.style.is_none());
    }
}
