//! Story setup parameters.

use serde::Deserialize;
use storyloom_core::error::StoryError;

/// Raw setup values as collected by the front end. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionSetup {
    /// Story genre, e.g. "fantasy".
    pub genre: Option<String>,
    /// Protagonist description.
    pub character: Option<String>,
    /// Narrative style, e.g. "whimsical".
    pub style: Option<String>,
}

/// Validated parameters fixed for the lifetime of one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryParameters {
    genre: String,
    character: String,
    style: String,
}

impl StoryParameters {
    /// Validates and normalises the three setup values.
    ///
    /// All values are trimmed and the genre is lowercased.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::MissingSetupParameters` listing every blank field.
    pub fn new(
        genre: impl AsRef<str>,
        character: impl AsRef<str>,
        style: impl AsRef<str>,
    ) -> Result<Self, StoryError> {
        Self::try_from(SessionSetup {
            genre: Some(genre.as_ref().to_owned()),
            character: Some(character.as_ref().to_owned()),
            style: Some(style.as_ref().to_owned()),
        })
    }

    /// The lowercased genre.
    #[must_use]
    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// The protagonist description.
    #[must_use]
    pub fn character(&self) -> &str {
        &self.character
    }

    /// The narrative style.
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl TryFrom<SessionSetup> for StoryParameters {
    type Error = StoryError;

    fn try_from(setup: SessionSetup) -> Result<Self, Self::Error> {
        let genre = present(setup.genre.as_deref());
        let character = present(setup.character.as_deref());
        let style = present(setup.style.as_deref());

        match (genre, character, style) {
            (Some(genre), Some(character), Some(style)) => Ok(Self {
                genre: genre.to_lowercase(),
                character: character.to_owned(),
                style: style.to_owned(),
            }),
            _ => {
                let missing = [("genre", genre), ("character", character), ("style", style)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(StoryError::MissingSetupParameters { missing })
            }
        }
    }
}
