//! Presentation port.
//!
//! The presenter owns every visible element. The core only holds the opaque
//! `SegmentHandle`s it hands back and asks for them to be discarded in
//! lockstep with history changes.

use async_trait::async_trait;

/// Opaque reference to one rendered block of story text or input chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(pub u64);

/// Receives story output from the turn controller.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// A generation request has been issued.
    async fn on_generating(&self);

    /// Render the story title.
    async fn on_title(&self, title: &str) -> SegmentHandle;

    /// Echo the reader's submitted choice.
    async fn on_choice_submitted(&self, choice: &str) -> SegmentHandle;

    /// Render one complete generated segment. Called once per segment.
    async fn on_segment_ready(&self, text: &str) -> SegmentHandle;

    /// The story is waiting for the reader's next choice.
    async fn on_awaiting_choice(&self);

    /// The story reached its terminal marker.
    async fn on_story_ended(&self);

    /// Show an error message.
    async fn on_error(&self, message: &str);

    /// Show a non-fatal notice.
    async fn on_notice(&self, message: &str);

    /// Remove previously rendered segments.
    async fn discard_segments(&self, handles: &[SegmentHandle]);

    /// The last turn pair was rewound.
    async fn on_undo_applied(&self);

    /// Everything was cleared for a fresh story.
    async fn on_restarted(&self);
}
