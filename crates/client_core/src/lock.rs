//! Per-control pending action locks.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Identifies one unregister control by the participant it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlKey {
    pub activity: String,
    pub email: String,
}

impl ControlKey {
    pub fn new(activity: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.activity, self.email)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    held: Arc<Mutex<HashSet<ControlKey>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another action on the same control is in flight.
    pub fn try_acquire(&self, key: ControlKey) -> Option<PendingActionLock> {
        if !self.held().insert(key.clone()) {
            return None;
        }
        Some(PendingActionLock {
            key,
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_locked(&self, key: &ControlKey) -> bool {
        self.held().contains(key)
    }

    pub fn held_keys(&self) -> Vec<ControlKey> {
        self.held().iter().cloned().collect()
    }

    fn held(&self) -> MutexGuard<'_, HashSet<ControlKey>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Released on drop, whichever way the owning action ends.
#[derive(Debug)]
pub struct PendingActionLock {
    key: ControlKey,
    held: Arc<Mutex<HashSet<ControlKey>>>,
}

impl PendingActionLock {
    pub fn key(&self) -> &ControlKey {
        &self.key
    }
}

impl Drop for PendingActionLock {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_same_control_is_refused_until_release() {
        let registry = LockRegistry::new();
        let key = ControlKey::new("Chess Club", "michael@mergington.edu");

        let lock = registry.try_acquire(key.clone()).expect("first acquire");
        assert!(registry.try_acquire(key.clone()).is_none());
        assert!(registry.is_locked(&key));

        drop(lock);
        assert!(!registry.is_locked(&key));
        assert!(registry.try_acquire(key).is_some());
    }

    #[test]
    fn locks_on_different_controls_are_independent() {
        let registry = LockRegistry::new();
        let chess = registry
            .try_acquire(ControlKey::new("Chess Club", "a@mergington.edu"))
            .expect("chess");
        let drama = registry
            .try_acquire(ControlKey::new("Drama Club", "a@mergington.edu"))
            .expect("drama");
        assert_eq!(registry.held_keys().len(), 2);

        drop(chess);
        assert_eq!(registry.held_keys(), vec![drama.key().clone()]);
    }
}
