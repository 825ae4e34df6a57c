//! Parsing generated text into story segments.

use super::prompts::TERMINAL_MARKER;

/// One labeled option offered at the end of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Option letter, `'A'` through `'D'`.
    pub label: char,
    /// Option text after the `X)` label.
    pub text: String,
}

/// A generated piece of story ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySegment {
    /// Title, present only on the opening segment.
    pub title: Option<String>,
    /// Narrative text shown to the reader.
    pub body: String,
    /// Labeled options found in the body. Empty once the story has ended.
    pub choices: Vec<Choice>,
    /// Whether the body contains the terminal marker.
    pub ended: bool,
}

impl StorySegment {
    fn from_body(title: Option<String>, body: String) -> Self {
        let ended = body.contains(TERMINAL_MARKER);
        let choices = if ended { Vec::new() } else { parse_choices(&body) };
        Self {
            title,
            body,
            choices,
            ended,
        }
    }
}

/// Parses the first response of a story: the title on the first line, an
/// optional blank separator, then the body.
#[must_use]
pub fn parse_opening(response: &str) -> StorySegment {
    let mut lines = response.trim_start().lines();
    let title = lines.next().map(clean_title).filter(|t| !t.is_empty());

    let mut rest: Vec<&str> = lines.collect();
    if rest.first().is_some_and(|line| line.trim().is_empty()) {
        rest.remove(0);
    }

    StorySegment::from_body(title, rest.join("\n"))
}

/// Parses a follow-up response. The whole text is body; no title is read.
#[must_use]
pub fn parse_continuation(response: &str) -> StorySegment {
    StorySegment::from_body(None, response.to_owned())
}

fn clean_title(line: &str) -> String {
    let line = line.trim().trim_start_matches('#').trim();
    let line = line
        .strip_prefix("**")
        .and_then(|inner| inner.strip_suffix("**"))
        .unwrap_or(line);
    line.trim().to_owned()
}

fn parse_choices(body: &str) -> Vec<Choice> {
    body.lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches("**");
            let mut chars = line.chars();
            let label = chars.next().filter(|c| ('A'..='D').contains(c))?;
            let rest = chars.as_str().strip_prefix(')')?;
            let text = rest.trim().trim_start_matches("**").trim_end_matches("**").trim();
            Some(Choice {
                label,
                text: text.to_owned(),
            })
        })
        .collect()
}
