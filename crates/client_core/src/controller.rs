//! Mutation controller: turns user commands into requests, feedback and refreshes.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    api::RosterApi,
    error::MutationError,
    feedback::FeedbackSlot,
    lock::{ControlKey, LockRegistry, PendingActionLock},
    render::{control_target, render, render_load_failure, Element, RenderSink},
};

pub const SIGNUP_REJECTED_FALLBACK: &str = "An error occurred";
pub const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_REJECTED_FALLBACK: &str = "Failed to unregister participant";
pub const UNREGISTER_FAILED: &str = "Failed to unregister participant. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    /// An empty field makes the command a no-op.
    Signup {
        email: String,
        activity: String,
    },
    /// Identifiers as read off the clicked control; either may be missing.
    Unregister {
        activity: Option<String>,
        email: Option<String>,
    },
}

impl Command {
    pub fn unregister_from(control: &Element) -> Self {
        let (activity, email) = control_target(control);
        Command::Unregister { activity, email }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Refresh => "refresh",
            Command::Signup { .. } => "signup",
            Command::Unregister { .. } => "unregister",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Refreshed,
    RefreshFailed,
    Succeeded,
    Rejected,
    Failed,
    /// A required identifier was missing or empty; nothing was sent.
    Ignored,
    /// The same control already has a request in flight.
    Busy,
    Aborted,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    RosterRendered { activities: usize },
    RosterLoadFailed(String),
}

/// A dispatched command running on its own task.
pub struct CommandHandle {
    command: &'static str,
    task: JoinHandle<CommandOutcome>,
}

impl CommandHandle {
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Cancels the in-flight request. Any pending action lock is released.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub async fn outcome(self) -> CommandOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => CommandOutcome::Aborted,
            Err(err) => {
                error!(command = self.command, %err, "command task panicked");
                CommandOutcome::Failed
            }
        }
    }
}

pub struct MutationController<S: RenderSink + 'static> {
    api: Arc<dyn RosterApi>,
    sink: Arc<Mutex<S>>,
    feedback: FeedbackSlot,
    locks: LockRegistry,
    events: broadcast::Sender<ClientEvent>,
}

impl<S: RenderSink + 'static> MutationController<S> {
    pub fn new(api: Arc<dyn RosterApi>, sink: Arc<Mutex<S>>) -> Arc<Self> {
        Self::new_with_feedback(api, sink, FeedbackSlot::default())
    }

    pub fn new_with_feedback(
        api: Arc<dyn RosterApi>,
        sink: Arc<Mutex<S>>,
        feedback: FeedbackSlot,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            api,
            sink,
            feedback,
            locks: LockRegistry::new(),
            events,
        })
    }

    pub fn feedback(&self) -> &FeedbackSlot {
        &self.feedback
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Initial fetch-and-render pass.
    pub fn start(self: &Arc<Self>) -> CommandHandle {
        self.dispatch(Command::Refresh)
    }

    pub fn dispatch(self: &Arc<Self>, command: Command) -> CommandHandle {
        let name = command.name();
        debug!(command = name, "dispatching command");
        let controller = Arc::clone(self);
        let task = tokio::spawn(async move { controller.execute(command).await });
        CommandHandle {
            command: name,
            task,
        }
    }

    pub async fn execute(&self, command: Command) -> CommandOutcome {
        match command {
            Command::Refresh => self.refresh().await,
            Command::Signup { email, activity } => self.signup(&email, &activity).await,
            Command::Unregister { activity, email } => {
                self.unregister(activity.as_deref(), email.as_deref()).await
            }
        }
    }

    /// Fetches the roster and rebuilds the display from it. Overlapping
    /// refreshes are not ordered; the last to finish wins.
    pub async fn refresh(&self) -> CommandOutcome {
        match self.api.fetch_roster().await {
            Ok(roster) => {
                // Held keys are read under the sink lock; `DisabledControl`
                // releases under the same lock.
                self.with_sink(|sink| {
                    render(&roster, sink);
                    for key in &self.locks.held_keys() {
                        sink.set_control_disabled(key, true);
                    }
                });
                info!(activities = roster.len(), "roster rendered");
                let _ = self.events.send(ClientEvent::RosterRendered {
                    activities: roster.len(),
                });
                CommandOutcome::Refreshed
            }
            Err(err) => {
                error!(%err, "error fetching activities");
                self.with_sink(|sink| render_load_failure(sink));
                let _ = self.events.send(ClientEvent::RosterLoadFailed(err.to_string()));
                CommandOutcome::RefreshFailed
            }
        }
    }

    pub async fn signup(&self, email: &str, activity: &str) -> CommandOutcome {
        if email.is_empty() || activity.is_empty() {
            debug!(activity, email, "signup missing a field");
            return CommandOutcome::Ignored;
        }

        match self.api.signup(activity, email).await {
            Ok(ack) => {
                info!(activity, email, "signed up");
                self.feedback.success(ack.message);
                self.with_sink(|sink| sink.reset_form());
                self.refresh().await;
                CommandOutcome::Succeeded
            }
            Err(err) => self.report_failure(
                "sign up",
                &err,
                SIGNUP_REJECTED_FALLBACK,
                SIGNUP_FAILED,
            ),
        }
    }

    pub async fn unregister(&self, activity: Option<&str>, email: Option<&str>) -> CommandOutcome {
        let (Some(activity), Some(email)) = (
            activity.filter(|value| !value.is_empty()),
            email.filter(|value| !value.is_empty()),
        ) else {
            return CommandOutcome::Ignored;
        };

        let Some(lock) = self.locks.try_acquire(ControlKey::new(activity, email)) else {
            debug!(activity, email, "unregister already in flight for control");
            return CommandOutcome::Busy;
        };
        let _control = DisabledControl::engage(lock, &self.sink);

        match self.api.unregister(activity, email).await {
            Ok(ack) => {
                info!(activity, email, "unregistered participant");
                self.feedback.success(ack.message);
                self.refresh().await;
                CommandOutcome::Succeeded
            }
            Err(err) => self.report_failure(
                "unregister participant",
                &err,
                UNREGISTER_REJECTED_FALLBACK,
                UNREGISTER_FAILED,
            ),
        }
    }

    fn report_failure(
        &self,
        action: &str,
        err: &MutationError,
        rejected_fallback: &str,
        failed_text: &str,
    ) -> CommandOutcome {
        if err.is_rejection() {
            debug!(action, %err, "request rejected by server");
            self.feedback
                .error(err.detail().unwrap_or(rejected_fallback));
            CommandOutcome::Rejected
        } else {
            error!(action, %err, "request failed");
            self.feedback.error(failed_text);
            CommandOutcome::Failed
        }
    }

    fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut sink)
    }
}

/// Keeps one remove control disabled for as long as its lock is held.
struct DisabledControl<'a, S: RenderSink> {
    lock: Option<PendingActionLock>,
    sink: &'a Mutex<S>,
}

impl<'a, S: RenderSink> DisabledControl<'a, S> {
    fn engage(lock: PendingActionLock, sink: &'a Mutex<S>) -> Self {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_control_disabled(lock.key(), true);
        Self {
            lock: Some(lock),
            sink,
        }
    }
}

impl<S: RenderSink> Drop for DisabledControl<'_, S> {
    fn drop(&mut self) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = self.lock.take() {
            sink.set_control_disabled(lock.key(), false);
            // Released while the sink is still locked so a concurrent refresh
            // sees either the held key or the enabled control, never a mix.
            drop(lock);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
