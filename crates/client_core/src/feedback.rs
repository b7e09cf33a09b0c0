//! The single transient success/error notice shown after a mutation.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};

pub const FEEDBACK_HIDE_AFTER: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

impl FeedbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::Success => "success",
            FeedbackKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    /// Increases with every `show`; the hide timer only acts on its own id.
    pub id: u64,
    pub text: String,
    pub kind: FeedbackKind,
    pub visible: bool,
}

#[derive(Clone)]
pub struct FeedbackSlot {
    inner: Arc<FeedbackInner>,
}

struct FeedbackInner {
    state: watch::Sender<Option<FeedbackMessage>>,
    next_id: AtomicU64,
    hide_task: Mutex<Option<JoinHandle<()>>>,
    hide_after: Duration,
}

impl FeedbackSlot {
    pub fn new(hide_after: Duration) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(FeedbackInner {
                state,
                next_id: AtomicU64::new(0),
                hide_task: Mutex::new(None),
                hide_after,
            }),
        }
    }

    pub fn success(&self, text: impl Into<String>) -> u64 {
        self.show(FeedbackKind::Success, text)
    }

    pub fn error(&self, text: impl Into<String>) -> u64 {
        self.show(FeedbackKind::Error, text)
    }

    /// Replaces whatever is showing and restarts the hide countdown.
    /// Must be called from within a tokio runtime.
    pub fn show(&self, kind: FeedbackKind, text: impl Into<String>) -> u64 {
        // Publishing and re-arming happen under one lock so the newest message
        // always owns the surviving timer.
        let mut hide_task = self
            .inner
            .hide_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.state.send_replace(Some(FeedbackMessage {
            id,
            text: text.into(),
            kind,
            visible: true,
        }));

        let slot: Weak<FeedbackInner> = Arc::downgrade(&self.inner);
        let hide_after = self.inner.hide_after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(hide_after).await;
            if let Some(inner) = slot.upgrade() {
                inner.hide(id);
            }
        });
        if let Some(previous) = hide_task.replace(task) {
            previous.abort();
        }
        id
    }

    pub fn current(&self) -> Option<FeedbackMessage> {
        self.inner.state.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.inner
            .state
            .borrow()
            .as_ref()
            .is_some_and(|message| message.visible)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<FeedbackMessage>> {
        self.inner.state.subscribe()
    }

    pub fn hide_after(&self) -> Duration {
        self.inner.hide_after
    }
}

impl Default for FeedbackSlot {
    fn default() -> Self {
        Self::new(FEEDBACK_HIDE_AFTER)
    }
}

impl FeedbackInner {
    fn hide(&self, id: u64) {
        self.state.send_if_modified(|slot| match slot {
            Some(message) if message.id == id && message.visible => {
                message.visible = false;
                true
            }
            _ => false,
        });
    }
}

#[cfg(test)]
#[path = "tests/feedback_tests.rs"]
mod tests;
