//! Markdown to ANSI terminal text.
//!
//! Only the inline emphasis the model is likely to emit gets styled. Block
//! structure collapses to plain lines and paragraphs.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

const BOLD: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";
const ITALIC: &str = "\x1b[3m";
const ITALIC_OFF: &str = "\x1b[23m";

/// Renders `source` with bold and italic spans as ANSI escapes.
#[must_use]
pub fn to_ansi(source: &str) -> String {
    let mut out = String::with_capacity(source.len());

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Strong | Tag::Heading { .. }) => out.push_str(BOLD),
            Event::End(TagEnd::Strong) => out.push_str(BOLD_OFF),
            Event::Start(Tag::Emphasis) => out.push_str(ITALIC),
            Event::End(TagEnd::Emphasis) => out.push_str(ITALIC_OFF),
            Event::End(TagEnd::Heading(_)) => {
                out.push_str(BOLD_OFF);
                out.push_str("\n\n");
            }
            Event::Start(Tag::Item) => out.push_str("- "),
            Event::End(TagEnd::Paragraph | TagEnd::List(_)) => {
                out.push_str("\n\n");
            }
            Event::End(TagEnd::Item) | Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                out.push_str(&text);
            }
            Event::Rule => out.push_str("---\n\n"),
            _ => {}
        }
    }

    out.trim_end().to_owned()
}
