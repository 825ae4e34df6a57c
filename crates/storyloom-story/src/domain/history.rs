//! Turn history store.
//!
//! History is held as user/model pairs, so the alternation invariant (even
//! length, user at even indices, model at odd ones) holds at every observable
//! point. Each pair also owns the display handles rendered for it, which is
//! what undo hands back for discarding.

use storyloom_core::error::StoryError;
use storyloom_core::presenter::SegmentHandle;
use storyloom_core::turn::{Role, Turn};

#[derive(Debug, Clone)]
struct Exchange {
    user: Turn,
    model: Turn,
    segments: Vec<SegmentHandle>,
}

/// Ordered user/model turn pairs for one story session.
#[derive(Debug, Clone, Default)]
pub struct TurnHistory {
    exchanges: Vec<Exchange>,
}

impl TurnHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns (always even).
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len() * 2
    }

    /// Returns `true` when no turn has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Appends one user/model pair.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::InvalidSequence` if `user_turn` is not a user turn
    /// or `model_turn` is not a model turn. The history is left untouched.
    pub fn append(&mut self, user_turn: Turn, model_turn: Turn) -> Result<(), StoryError> {
        if user_turn.role != Role::User {
            return Err(StoryError::InvalidSequence(format!(
                "turn {} must be a user turn",
                self.len()
            )));
        }
        if model_turn.role != Role::Model {
            return Err(StoryError::InvalidSequence(format!(
                "turn {} must be a model turn",
                self.len() + 1
            )));
        }

        self.exchanges.push(Exchange {
            user: user_turn,
            model: model_turn,
            segments: Vec::new(),
        });
        Ok(())
    }

    /// Associates rendered display handles with the most recent pair.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::InvalidSequence` if the history is empty.
    pub fn attach_segments(
        &mut self,
        handles: impl IntoIterator<Item = SegmentHandle>,
    ) -> Result<(), StoryError> {
        let exchange = self.exchanges.last_mut().ok_or_else(|| {
            StoryError::InvalidSequence("no turn pair to attach segments to".to_owned())
        })?;
        exchange.segments.extend(handles);
        Ok(())
    }

    /// Removes the most recent model turn and the user turn before it.
    ///
    /// Returns the display handles that belonged to the removed pair.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::NothingToUndo` when fewer than two turns exist.
    pub fn undo_last_turn(&mut self) -> Result<Vec<SegmentHandle>, StoryError> {
        self.exchanges
            .pop()
            .map(|exchange| exchange.segments)
            .ok_or(StoryError::NothingToUndo)
    }

    /// Clears the history, returning every display handle it held.
    pub fn reset(&mut self) -> Vec<SegmentHandle> {
        self.exchanges
            .drain(..)
            .flat_map(|exchange| exchange.segments)
            .collect()
    }

    /// Copies the turns out in chronological order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.exchanges
            .iter()
            .flat_map(|exchange| [exchange.user.clone(), exchange.model.clone()])
            .collect()
    }
}
