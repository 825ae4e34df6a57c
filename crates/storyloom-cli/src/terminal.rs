//! Terminal presenter.
//!
//! Keeps a transcript of every rendered block keyed by its handle. Discarding
//! blocks clears the screen and reprints what is left, so the visible story
//! always matches the turn history.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use storyloom_core::presenter::{Presenter, SegmentHandle};
use tokio::sync::Mutex;
use tracing::warn;

use crate::markdown;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const CLEAR_LINE: &str = "\r\x1b[2K";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Placeholder shown while a request is outstanding.
pub const GENERATING_TEXT: &str = "Generating story...";

struct Screen<W> {
    out: W,
    transcript: Vec<(SegmentHandle, String)>,
    next_handle: u64,
    placeholder_visible: bool,
}

impl<W: Write> Screen<W> {
    fn allocate(&mut self, text: String) -> SegmentHandle {
        self.next_handle += 1;
        let handle = SegmentHandle(self.next_handle);
        self.transcript.push((handle, text));
        handle
    }

    fn clear_placeholder(&mut self) {
        if self.placeholder_visible {
            self.placeholder_visible = false;
            self.write(CLEAR_LINE);
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %err, "failed to write to terminal");
        }
    }

    fn redraw(&mut self) {
        let mut frame = String::from(CLEAR_SCREEN);
        for (_, block) in &self.transcript {
            frame.push_str(block);
            frame.push_str("\n\n");
        }
        self.placeholder_visible = false;
        self.write(&frame);
    }
}

/// Presenter that writes the story to a terminal-like sink.
pub struct TerminalPresenter<W> {
    screen: Mutex<Screen<W>>,
    typing_delay: Option<Duration>,
}

impl<W: Write + Send> TerminalPresenter<W> {
    /// Creates a presenter writing to `out`. With a `typing_delay`, blocks
    /// are revealed one character at a time.
    #[must_use]
    pub fn new(out: W, typing_delay: Option<Duration>) -> Self {
        Self {
            screen: Mutex::new(Screen {
                out,
                transcript: Vec::new(),
                next_handle: 0,
                placeholder_visible: false,
            }),
            typing_delay,
        }
    }

    /// Rendered text of every block still on screen, in order.
    pub async fn transcript(&self) -> Vec<String> {
        self.screen
            .lock()
            .await
            .transcript
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    async fn render_block(&self, text: String) -> SegmentHandle {
        let mut screen = self.screen.lock().await;
        screen.clear_placeholder();

        match self.typing_delay {
            Some(delay) if !delay.is_zero() => {
                let mut buf = [0u8; 4];
                for ch in text.chars() {
                    screen.write(ch.encode_utf8(&mut buf));
                    tokio::time::sleep(delay).await;
                }
            }
            _ => screen.write(&text),
        }
        screen.write("\n\n");

        screen.allocate(text)
    }

    async fn write_line(&self, text: &str) {
        let mut screen = self.screen.lock().await;
        screen.clear_placeholder();
        screen.write(text);
        screen.write("\n");
    }
}

#[async_trait]
impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    async fn on_generating(&self) {
        let mut screen = self.screen.lock().await;
        screen.clear_placeholder();
        screen.write(&format!("{DIM}{GENERATING_TEXT}{RESET}"));
        screen.placeholder_visible = true;
    }

    async fn on_title(&self, title: &str) -> SegmentHandle {
        self.render_block(format!("\x1b[1m{title}{RESET}")).await
    }

    async fn on_choice_submitted(&self, choice: &str) -> SegmentHandle {
        self.render_block(format!("{DIM}You chose: {choice}{RESET}"))
            .await
    }

    async fn on_segment_ready(&self, text: &str) -> SegmentHandle {
        self.render_block(markdown::to_ansi(text)).await
    }

    async fn on_awaiting_choice(&self) {
        self.write_line("Type your choice (A-D or your own), or /help.").await;
    }

    async fn on_story_ended(&self) {
        self.write_line("The story has ended. Type /undo to go back or /restart for a new tale.")
            .await;
    }

    async fn on_error(&self, message: &str) {
        self.write_line(&format!("{RED}{message}{RESET}")).await;
    }

    async fn on_notice(&self, message: &str) {
        self.write_line(&format!("{YELLOW}{message}{RESET}")).await;
    }

    async fn discard_segments(&self, handles: &[SegmentHandle]) {
        let mut screen = self.screen.lock().await;
        screen
            .transcript
            .retain(|(handle, _)| !handles.contains(handle));
        screen.redraw();
    }

    async fn on_undo_applied(&self) {
        self.write_line(&format!("{DIM}Rewound the last turn.{RESET}")).await;
    }

    async fn on_restarted(&self) {
        let mut screen = self.screen.lock().await;
        screen.transcript.clear();
        screen.redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_blocks_get_distinct_handles_in_order() {
        // Arrange
        let presenter = TerminalPresenter::new(SharedBuf::default(), None);

        // Act
        let title = presenter.on_title("The Gate").await;
        let segment = presenter.on_segment_ready("A gate looms.").await;

        // Assert
        assert_ne!(title, segment);
        assert_eq!(presenter.transcript().await.len(), 2);
    }

    #[tokio::test]
    async fn test_discard_removes_only_named_blocks_and_redraws() {
        // Arrange
        let buf = SharedBuf::default();
        let presenter = TerminalPresenter::new(buf.clone(), None);
        presenter.on_segment_ready("Opening text").await;
        let echo = presenter.on_choice_submitted("A").await;
        let reply = presenter.on_segment_ready("Second text").await;

        // Act
        presenter.discard_segments(&[echo, reply]).await;

        // Assert
        assert_eq!(presenter.transcript().await, vec!["Opening text".to_owned()]);
        let output = buf.contents();
        let after_clear = output.rsplit(CLEAR_SCREEN).next().unwrap();
        assert!(after_clear.contains("Opening text"));
        assert!(!after_clear.contains("Second text"));
    }

    #[tokio::test]
    async fn test_generating_placeholder_is_cleared_by_next_block() {
        let buf = SharedBuf::default();
        let presenter = TerminalPresenter::new(buf.clone(), None);

        presenter.on_generating().await;
        presenter.on_segment_ready("Story").await;

        let output = buf.contents();
        let placeholder_at = output.find(GENERATING_TEXT).unwrap();
        let clear_at = output.find(CLEAR_LINE).unwrap();
        assert!(clear_at > placeholder_at);
        assert!(output.ends_with("Story\n\n"));
    }

    #[tokio::test]
    async fn test_typing_effect_writes_every_character() {
        let buf = SharedBuf::default();
        let presenter = TerminalPresenter::new(buf.clone(), Some(Duration::from_millis(1)));

        presenter.on_segment_ready("Hi!").await;

        assert_eq!(buf.contents(), "Hi!\n\n");
    }

    #[tokio::test]
    async fn test_restart_empties_transcript() {
        let presenter = TerminalPresenter::new(SharedBuf::default(), None);
        presenter.on_title("The Gate").await;

        presenter.on_restarted().await;

        assert!(presenter.transcript().await.is_empty());
    }
}
