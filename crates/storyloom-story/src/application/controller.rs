//! Turn controller.
//!
//! Drives one story turn at a time: builds the prompt, calls the generation
//! gateway, records the exchange, and hands the text to the presenter. All
//! mutable session state sits behind one mutex that is never held across an
//! `.await`. Every request carries the session epoch it was issued under;
//! `restart` bumps the epoch, so a response that arrives afterwards is
//! dropped instead of being recorded into the fresh history.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storyloom_core::error::StoryError;
use storyloom_core::gateway::{GenerationGateway, GenerationRequest};
use storyloom_core::presenter::{Presenter, SegmentHandle};
use storyloom_core::turn::Turn;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::history::TurnHistory;
use crate::domain::parameters::{SessionSetup, StoryParameters};
use crate::domain::prompts::{build_continuation_prompt, build_initial_prompt};
use crate::domain::segment::{StorySegment, parse_continuation, parse_opening};

/// Controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn has been requested yet, or the history was rewound to empty.
    Idle,
    /// A generation request is outstanding.
    AwaitingGeneration,
    /// The latest segment is displayed and a choice is expected.
    Ready,
    /// The latest segment contained the terminal marker.
    Ended,
    /// The latest request failed; the history was left untouched.
    Failed,
}

/// Result of a controller operation that may issue a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A new segment was generated, recorded and presented.
    Segment(StorySegment),
    /// Blank input; nothing happened.
    Ignored,
    /// The session was restarted while this request was outstanding.
    Discarded,
}

#[derive(Debug, Clone)]
enum TurnKind {
    Opening,
    Continuation(String),
}

impl TurnKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Continuation(_) => "continuation",
        }
    }
}

#[derive(Debug)]
struct Session {
    state: TurnState,
    history: TurnHistory,
    params: Option<StoryParameters>,
    title: Option<String>,
    epoch: u64,
    failed_turn: Option<TurnKind>,
    in_flight_segments: Vec<SegmentHandle>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: TurnState::Idle,
            history: TurnHistory::new(),
            params: None,
            title: None,
            epoch: 0,
            failed_turn: None,
            in_flight_segments: Vec::new(),
        }
    }
}

/// Orchestrates the turns of one story session.
pub struct TurnController {
    gateway: Arc<dyn GenerationGateway>,
    presenter: Arc<dyn Presenter>,
    session: Mutex<Session>,
}

impl fmt::Debug for TurnController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnController")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Creates a controller for a new, empty session.
    #[must_use]
    pub fn new(gateway: Arc<dyn GenerationGateway>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            gateway,
            presenter,
            session: Mutex::new(Session::new()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.session().state
    }

    /// Title parsed from the opening segment, if one has been generated.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.session().title.clone()
    }

    /// Copy of the current history.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.session().history.snapshot()
    }

    /// Validates the setup parameters and generates the opening segment.
    ///
    /// Any story already in progress is discarded as if by `restart`.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::MissingSetupParameters` without contacting the
    /// gateway if a parameter is absent, and `StoryError::GenerationFailed`
    /// if the opening request fails.
    pub async fn start_story(&self, setup: SessionSetup) -> Result<TurnOutcome, StoryError> {
        let params = match StoryParameters::try_from(setup) {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "refusing to start story");
                self.presenter.on_error(&err.user_message()).await;
                return Err(err);
            }
        };

        let announce = self.session().params.is_some();
        self.reset_and_open(params, announce).await
    }

    /// Continues the story from the reader's choice.
    ///
    /// Blank input is ignored without a state change.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::GenerationInFlight` while a request is
    /// outstanding, `StoryError::StoryEnded` after the terminal marker,
    /// `StoryError::NotStarted` when there is no story to continue, and
    /// `StoryError::GenerationFailed` when the gateway fails.
    pub async fn submit_choice(&self, text: &str) -> Result<TurnOutcome, StoryError> {
        let choice = text.trim();
        if choice.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }
        self.run_turn(TurnKind::Continuation(choice.to_owned()))
            .await
    }

    /// Re-issues the request that last failed.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::NotStarted` when the controller is not in the
    /// `Failed` state, otherwise whatever the repeated turn returns.
    pub async fn retry(&self) -> Result<TurnOutcome, StoryError> {
        let failed_turn = {
            let session = self.session();
            match (session.state, &session.failed_turn) {
                (TurnState::Failed, Some(kind)) => Some(kind.clone()),
                _ => None,
            }
        };

        match failed_turn {
            Some(kind) => self.run_turn(kind).await,
            None => {
                let err = StoryError::NotStarted;
                self.presenter.on_notice(&err.user_message()).await;
                Err(err)
            }
        }
    }

    /// Rewinds the most recent user/model pair and its displayed segments.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::NothingToUndo` when the history is empty and
    /// `StoryError::GenerationInFlight` while a request is outstanding.
    pub async fn undo(&self) -> Result<(), StoryError> {
        let undone = {
            let mut session = self.session();
            if session.state == TurnState::AwaitingGeneration {
                Err(StoryError::GenerationInFlight)
            } else {
                let removed = session.history.undo_last_turn();
                match removed {
                    Ok(handles) => {
                        if session.history.is_empty() {
                            session.state = TurnState::Idle;
                            session.title = None;
                        } else {
                            session.state = TurnState::Ready;
                        }
                        session.failed_turn = None;
                        Ok((handles, session.state, session.history.len()))
                    }
                    Err(err) => Err(err),
                }
            }
        };

        match undone {
            Ok((handles, state, remaining_turns)) => {
                info!(remaining_turns, "undid last turn");
                self.presenter.discard_segments(&handles).await;
                self.presenter.on_undo_applied().await;
                if state == TurnState::Ready {
                    self.presenter.on_awaiting_choice().await;
                }
                Ok(())
            }
            Err(err) => {
                self.presenter.on_notice(&err.user_message()).await;
                Err(err)
            }
        }
    }

    /// Clears the story and generates a fresh opening with the same
    /// parameters. Safe to call while a request is outstanding.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::NotStarted` if no parameters were ever accepted,
    /// and `StoryError::GenerationFailed` if the new opening fails.
    pub async fn restart(&self) -> Result<TurnOutcome, StoryError> {
        let params = self.session().params.clone();
        match params {
            Some(params) => self.reset_and_open(params, true).await,
            None => {
                let err = StoryError::NotStarted;
                self.presenter.on_notice(&err.user_message()).await;
                Err(err)
            }
        }
    }

    async fn reset_and_open(
        &self,
        params: StoryParameters,
        announce: bool,
    ) -> Result<TurnOutcome, StoryError> {
        let discarded = {
            let mut session = self.session();
            session.epoch += 1;
            let mut discarded = session.history.reset();
            discarded.append(&mut session.in_flight_segments);
            session.params = Some(params);
            session.title = None;
            session.failed_turn = None;
            session.state = TurnState::Idle;
            discarded
        };

        if announce {
            info!(discarded_segments = discarded.len(), "restarting story");
            if !discarded.is_empty() {
                self.presenter.discard_segments(&discarded).await;
            }
            self.presenter.on_restarted().await;
        }

        self.run_turn(TurnKind::Opening).await
    }

    async fn run_turn(&self, kind: TurnKind) -> Result<TurnOutcome, StoryError> {
        let span = info_span!(
            "story_turn",
            correlation_id = %Uuid::new_v4(),
            kind = kind.name()
        );
        self.execute_turn(kind).instrument(span).await
    }

    fn begin_turn(&self, kind: &TurnKind) -> Result<(u64, GenerationRequest), StoryError> {
        let mut session = self.session();
        if session.state == TurnState::AwaitingGeneration {
            return Err(StoryError::GenerationInFlight);
        }

        let prompt = match kind {
            TurnKind::Opening => {
                let params = session.params.as_ref().ok_or(StoryError::NotStarted)?;
                build_initial_prompt(params)
            }
            TurnKind::Continuation(choice) => {
                if session.state == TurnState::Ended {
                    return Err(StoryError::StoryEnded);
                }
                if session.history.is_empty() {
                    return Err(StoryError::NotStarted);
                }
                build_continuation_prompt(choice)
            }
        };

        session.state = TurnState::AwaitingGeneration;
        let request = GenerationRequest::new(prompt, session.history.snapshot());
        Ok((session.epoch, request))
    }

    fn record(
        session: &mut Session,
        kind: &TurnKind,
        prompt: String,
        text: String,
    ) -> Result<StorySegment, StoryError> {
        if text.trim().is_empty() {
            return Err(StoryError::GenerationFailed(
                "generator returned empty text".to_owned(),
            ));
        }

        let segment = match kind {
            TurnKind::Opening => parse_opening(&text),
            TurnKind::Continuation(_) => parse_continuation(&text),
        };
        session.history.append(Turn::user(prompt), Turn::model(text))?;

        if segment.title.is_some() {
            session.title.clone_from(&segment.title);
        }
        session.failed_turn = None;
        Ok(segment)
    }

    async fn execute_turn(&self, kind: TurnKind) -> Result<TurnOutcome, StoryError> {
        let (epoch, request) = match self.begin_turn(&kind) {
            Ok(begun) => begun,
            Err(err) => {
                debug!(error = %err, "turn refused");
                self.presenter.on_notice(&err.user_message()).await;
                return Err(err);
            }
        };

        if let TurnKind::Continuation(choice) = &kind {
            let handle = self.presenter.on_choice_submitted(choice).await;
            let current = {
                let mut session = self.session();
                let current = session.epoch == epoch;
                if current {
                    session.in_flight_segments.push(handle);
                }
                current
            };
            if !current {
                self.presenter.discard_segments(&[handle]).await;
                return Ok(TurnOutcome::Discarded);
            }
        }
        self.presenter.on_generating().await;

        info!(history_len = request.history.len(), "requesting generation");
        let result = self.gateway.generate(&request).await;
        let GenerationRequest { prompt, .. } = request;

        let recorded = {
            let mut session = self.session();
            if session.epoch != epoch {
                debug!("dropping response issued before restart");
                return Ok(TurnOutcome::Discarded);
            }
            let pending = std::mem::take(&mut session.in_flight_segments);
            match result.and_then(|text| Self::record(&mut session, &kind, prompt, text)) {
                Ok(segment) => Ok((segment, pending)),
                Err(err) => {
                    session.state = TurnState::Failed;
                    session.failed_turn = Some(kind.clone());
                    Err((err, pending))
                }
            }
        };

        let (segment, mut handles) = match recorded {
            Ok(recorded) => recorded,
            Err((err, pending)) => {
                warn!(error = %err, "story turn failed");
                if !pending.is_empty() {
                    self.presenter.discard_segments(&pending).await;
                }
                self.presenter.on_error(&err.user_message()).await;
                return Err(err);
            }
        };

        if let Some(title) = &segment.title {
            handles.push(self.presenter.on_title(title).await);
        }
        handles.push(self.presenter.on_segment_ready(&segment.body).await);

        let current = {
            let mut session = self.session();
            let current = session.epoch == epoch;
            if current {
                if let Err(err) = session.history.attach_segments(handles.iter().copied()) {
                    warn!(error = %err, "could not attach rendered segments");
                }
                session.state = if segment.ended {
                    TurnState::Ended
                } else {
                    TurnState::Ready
                };
            }
            current
        };
        if !current {
            self.presenter.discard_segments(&handles).await;
            return Ok(TurnOutcome::Discarded);
        }

        if segment.ended {
            info!("story reached its terminal marker");
            self.presenter.on_story_ended().await;
        } else {
            self.presenter.on_awaiting_choice().await;
        }
        Ok(TurnOutcome::Segment(segment))
    }
}
