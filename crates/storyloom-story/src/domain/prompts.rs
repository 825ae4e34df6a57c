//! Prompt construction.

use super::parameters::StoryParameters;

/// Exact line the generator emits when the story concludes.
pub const TERMINAL_MARKER: &str = "The End.";

/// Builds the prompt that opens a story: a title line, a blank line, the
/// first segment, and four labeled choices.
#[must_use]
pub fn build_initial_prompt(params: &StoryParameters) -> String {
    format!(
        "Give me an enchanting story title and the first segment of a {style} {genre} story \
         featuring {character}. Write the title on the first line, then a blank line, \
         then the first story segment. End the segment with four labeled choices: \
         A), B), C), D).",
        style = params.style(),
        genre = params.genre(),
        character = with_article(params.character()),
    )
}

/// Words that already determine the character, so no article is added.
const DETERMINERS: [&str; 16] = [
    "a", "an", "the", "some", "any", "one", "two", "three", "several", "my", "his", "her",
    "their", "our", "this", "that",
];

/// Prefixes "a " or "an " unless the description already opens with a
/// determiner.
fn with_article(character: &str) -> String {
    let first_word = character
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if DETERMINERS.contains(&first_word.as_str()) {
        return character.to_owned();
    }
    let article = match first_word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{article} {character}")
}

/// Builds the prompt that continues the story from the reader's choice.
///
/// Callers reject blank choices before getting here.
#[must_use]
pub fn build_continuation_prompt(user_choice: &str) -> String {
    format!(
        "Based on the user's response: \"{user_choice}\", continue the interactive story. \
         Maintain the same tone, characters, and style. If the story is near its end, \
         conclude it naturally. Otherwise, end the segment with four distinct choices \
         labeled A), B), C), and D). End the story clearly with the line: \
         \"{TERMINAL_MARKER}\" when it concludes, and do not include \"*\" in the \
         generated story."
    )
}
