pub mod api;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod lock;
pub mod render;

pub use api::{HttpRosterApi, RosterApi};
pub use controller::{ClientEvent, Command, CommandHandle, CommandOutcome, MutationController};
pub use error::{FetchError, MutationError};
pub use feedback::{FeedbackKind, FeedbackMessage, FeedbackSlot, FEEDBACK_HIDE_AFTER};
pub use lock::{ControlKey, LockRegistry, PendingActionLock};
pub use render::{MemorySurface, Node, Region, RenderSink, SignupForm};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
