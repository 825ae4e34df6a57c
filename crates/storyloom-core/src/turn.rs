//! Role-tagged conversation turns.

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A prompt sent to the generator.
    User,
    /// Text returned by the generator.
    Model,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One role-tagged message in the conversation sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Turn {
    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a model turn.
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Role expected at `index` in a well-formed history.
#[must_use]
pub fn expected_role(index: usize) -> Role {
    if index % 2 == 0 { Role::User } else { Role::Model }
}

/// Checks that `history` has even length and strictly alternates user/model.
///
/// # Errors
///
/// Returns `StoryError::InvalidSequence` naming the first offending position.
pub fn validate_history(history: &[Turn]) -> Result<(), StoryError> {
    if let Some((index, turn)) = history
        .iter()
        .enumerate()
        .find(|(index, turn)| turn.role != expected_role(*index))
    {
        return Err(StoryError::InvalidSequence(format!(
            "turn {index} has role {}, expected {}",
            turn.role.as_str(),
            expected_role(index).as_str()
        )));
    }

    if history.len() % 2 != 0 {
        return Err(StoryError::InvalidSequence(format!(
            "history has odd length {}",
            history.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_with_lowercase_role() {
        let turn = Turn::model("Once upon a time");

        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "role": "model", "content": "Once upon a time" })
        );
    }

    #[test]
    fn test_turn_rejects_unknown_role() {
        let result: Result<Turn, _> =
            serde_json::from_value(serde_json::json!({ "role": "system", "content": "x" }));

        assert!(result.is_err());
    }

    #[test]
    fn test_validate_history_accepts_empty_and_paired_histories() {
        assert!(validate_history(&[]).is_ok());
        assert!(
            validate_history(&[
                Turn::user("p1"),
                Turn::model("r1"),
                Turn::user("p2"),
                Turn::model("r2"),
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_validate_history_rejects_dangling_user_turn() {
        let result = validate_history(&[Turn::user("p1"), Turn::model("r1"), Turn::user("p2")]);

        assert!(matches!(result, Err(StoryError::InvalidSequence(_))));
    }

    #[test]
    fn test_validate_history_rejects_consecutive_user_turns() {
        let result = validate_history(&[Turn::user("p1"), Turn::user("p2")]);

        match result {
            Err(StoryError::InvalidSequence(message)) => {
                assert!(message.contains("turn 1"));
            }
            other => panic!("expected InvalidSequence, got {other:?}"),
        }
    }
}
