//! Story error types.

use thiserror::Error;

/// Top-level error type shared by every Storyloom crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    /// One or more of genre, character or style was absent or blank.
    #[error("missing story setup parameters: {}", missing.join(", "))]
    MissingSetupParameters {
        /// Names of the absent parameters, in declaration order.
        missing: Vec<&'static str>,
    },

    /// The generation gateway failed or returned a malformed payload.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// Undo was requested with no complete turn pair in the history.
    #[error("nothing to undo")]
    NothingToUndo,

    /// A history append or payload broke the user/model alternation.
    #[error("invalid turn sequence: {0}")]
    InvalidSequence(String),

    /// A generation request is already outstanding for this session.
    #[error("a generation request is already in flight")]
    GenerationInFlight,

    /// The story reached its terminal marker; only undo or restart remain.
    #[error("the story has ended")]
    StoryEnded,

    /// No story has been started, so there is nothing to continue.
    #[error("no story has been started")]
    NotStarted,
}

impl StoryError {
    /// Text suitable for showing to the reader.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingSetupParameters { .. } => {
                "Missing story setup. Please go back to the start page.".to_owned()
            }
            Self::GenerationFailed(_) => "Failed to load story from Gemini.".to_owned(),
            Self::NothingToUndo => "Nothing to undo.".to_owned(),
            Self::InvalidSequence(_) => {
                "Something went wrong recording that turn. Please try again.".to_owned()
            }
            Self::GenerationInFlight => "Still writing the last part of the story...".to_owned(),
            Self::StoryEnded => "The story has ended. Undo or restart to keep playing.".to_owned(),
            Self::NotStarted => "Start or restart the story first.".to_owned(),
        }
    }
}
