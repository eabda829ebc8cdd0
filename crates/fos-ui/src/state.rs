//! Reactive component state
//!
//! State values are JSON values. Each write reports whether the owning
//! component has to re-render; the caller performs the update.

use serde_json::{Map, Value};

/// Where the owning instance sits, as seen by a state write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Root instance without a live tree
    Detached,
    /// Root instance with a live tree
    Mounted,
    /// Child instance (updates go through the parent)
    Child,
}

/// Outcome of a state write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateWrite {
    /// First write of a key; never triggers an update
    Registered,
    /// Value stored, no update needed
    Applied,
    /// Value stored and an update must run
    Scheduled,
}

impl StateWrite {
    /// Whether the write requires an update
    pub fn is_scheduled(self) -> bool {
        self == Self::Scheduled
    }
}

/// Observable key/value state with a snapshot of last-applied values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactiveState {
    values: Map<String, Value>,
    snapshot: Map<String, Value>,
}

impl ReactiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether a key has been written
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All current values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Value last used to schedule an update for a key
    pub fn snapshot(&self, key: &str) -> Option<&Value> {
        self.snapshot.get(key)
    }

    /// Write a value
    ///
    /// Mounted roots compare against the snapshot so repeated writes of the
    /// same value schedule at most one update.
    pub fn set(&mut self, key: &str, value: Value, attachment: Attachment) -> StateWrite {
        if !self.values.contains_key(key) {
            self.values.insert(key.to_string(), value);
            return StateWrite::Registered;
        }

        let outcome = match attachment {
            Attachment::Child => StateWrite::Scheduled,
            Attachment::Mounted if self.snapshot.get(key) != Some(&value) => {
                self.snapshot.insert(key.to_string(), value.clone());
                StateWrite::Scheduled
            }
            Attachment::Mounted | Attachment::Detached => StateWrite::Applied,
        };
        self.values.insert(key.to_string(), value);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_write_registers() {
        let mut state = ReactiveState::new();
        assert_eq!(state.set("a", json!(1), Attachment::Mounted), StateWrite::Registered);
        assert_eq!(state.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_mounted_suppresses_repeat() {
        let mut state = ReactiveState::new();
        state.set("a", json!("hi"), Attachment::Mounted);
        assert_eq!(state.set("a", json!("bye"), Attachment::Mounted), StateWrite::Scheduled);
        assert_eq!(state.set("a", json!("bye"), Attachment::Mounted), StateWrite::Applied);
        assert_eq!(state.snapshot("a"), Some(&json!("bye")));
    }

    #[test]
    fn test_structural_equality() {
        let mut state = ReactiveState::new();
        state.set("list", json!([1, 2]), Attachment::Mounted);
        state.set("list", json!({"x": [1, 2]}), Attachment::Mounted);
        assert_eq!(
            state.set("list", json!({"x": [1, 2]}), Attachment::Mounted),
            StateWrite::Applied
        );
    }

    #[test]
    fn test_detached_never_schedules() {
        let mut state = ReactiveState::new();
        state.set("a", json!(1), Attachment::Detached);
        assert_eq!(state.set("a", json!(2), Attachment::Detached), StateWrite::Applied);
        assert_eq!(state.get("a"), Some(&json!(2)));
        assert_eq!(state.snapshot("a"), None);
    }

    #[test]
    fn test_child_always_schedules() {
        let mut state = ReactiveState::new();
        state.set("a", json!(1), Attachment::Child);
        assert!(state.set("a", json!(1), Attachment::Child).is_scheduled());
        assert!(state.set("a", json!(1), Attachment::Child).is_scheduled());
    }
}
