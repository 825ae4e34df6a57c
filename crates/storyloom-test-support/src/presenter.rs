//! Test presenter: records every callback the controller makes.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use storyloom_core::presenter::{Presenter, SegmentHandle};

/// One recorded presenter callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    /// `on_generating`.
    Generating,
    /// `on_title` and the handle returned.
    Title(String, SegmentHandle),
    /// `on_choice_submitted` and the handle returned.
    ChoiceSubmitted(String, SegmentHandle),
    /// `on_segment_ready` and the handle returned.
    Segment(String, SegmentHandle),
    /// `on_awaiting_choice`.
    AwaitingChoice,
    /// `on_story_ended`.
    StoryEnded,
    /// `on_error`.
    Error(String),
    /// `on_notice`.
    Notice(String),
    /// `discard_segments`.
    Discarded(Vec<SegmentHandle>),
    /// `on_undo_applied`.
    UndoApplied,
    /// `on_restarted`.
    Restarted,
}

/// A presenter that allocates sequential handles and records every call.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    next_handle: AtomicU64,
    events: Mutex<Vec<PresenterEvent>>,
    visible: Mutex<BTreeSet<SegmentHandle>>,
}

impl RecordingPresenter {
    /// Create an empty recording presenter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded callbacks.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Handles rendered and not yet discarded.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn visible(&self) -> Vec<SegmentHandle> {
        self.visible.lock().unwrap().iter().copied().collect()
    }

    /// Number of recorded callbacks matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&PresenterEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    fn record(&self, event: PresenterEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn render(&self, make: impl FnOnce(SegmentHandle) -> PresenterEvent) -> SegmentHandle {
        let handle = SegmentHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        self.visible.lock().unwrap().insert(handle);
        self.record(make(handle));
        handle
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn on_generating(&self) {
        self.record(PresenterEvent::Generating);
    }

    async fn on_title(&self, title: &str) -> SegmentHandle {
        self.render(|h| PresenterEvent::Title(title.to_owned(), h))
    }

    async fn on_choice_submitted(&self, choice: &str) -> SegmentHandle {
        self.render(|h| PresenterEvent::ChoiceSubmitted(choice.to_owned(), h))
    }

    async fn on_segment_ready(&self, text: &str) -> SegmentHandle {
        self.render(|h| PresenterEvent::Segment(text.to_owned(), h))
    }

    async fn on_awaiting_choice(&self) {
        self.record(PresenterEvent::AwaitingChoice);
    }

    async fn on_story_ended(&self) {
        self.record(PresenterEvent::StoryEnded);
    }

    async fn on_error(&self, message: &str) {
        self.record(PresenterEvent::Error(message.to_owned()));
    }

    async fn on_notice(&self, message: &str) {
        self.record(PresenterEvent::Notice(message.to_owned()));
    }

    async fn discard_segments(&self, handles: &[SegmentHandle]) {
        {
            let mut visible = self.visible.lock().unwrap();
            for handle in handles {
                visible.remove(handle);
            }
        }
        self.record(PresenterEvent::Discarded(handles.to_vec()));
    }

    async fn on_undo_applied(&self) {
        self.record(PresenterEvent::UndoApplied);
    }

    async fn on_restarted(&self) {
        self.record(PresenterEvent::Restarted);
    }
}
