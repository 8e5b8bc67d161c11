use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::llm::models::Message;

pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Rolling chat history, one buffer per participant.
///
/// Each participant only ever sees their own history; clearing without a
/// key resets every buffer.
#[derive(Debug)]
pub struct SessionStore {
    max_messages: usize,
    buffers: Mutex<HashMap<String, Vec<Message>>>,
}

impl SessionStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            buffers: Mutex::new(HashMap::new()),
        }
    }

    fn buffers(&self) -> MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.buffers.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn key(participant_id: Option<&str>) -> &str {
        match participant_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => ANONYMOUS_SESSION,
        }
    }

    /// Records the user's message and returns the history to send upstream.
    pub fn push_user(&self, key: &str, content: &str) -> Vec<Message> {
        let mut buffers = self.buffers();
        let history = buffers.entry(key.to_string()).or_default();
        history.push(Message::user(content));
        history.clone()
    }

    /// Records the reply, then drops the oldest pair while over capacity.
    pub fn push_assistant(&self, key: &str, content: &str) {
        let mut buffers = self.buffers();
        let history = buffers.entry(key.to_string()).or_default();
        history.push(Message::assistant(content));
        while history.len() > self.max_messages {
            let drop = history.len().min(2);
            history.drain(..drop);
        }
    }

    pub fn history(&self, key: &str) -> Vec<Message> {
        self.buffers().get(key).cloned().unwrap_or_default()
    }

    pub fn clear(&self, key: Option<&str>) {
        let mut buffers = self.buffers();
        match key {
            Some(key) => {
                buffers.remove(key);
            }
            None => buffers.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_oldest_pair_past_capacity() {
        let store = SessionStore::new(4);
        for i in 0..3 {
            store.push_user("p1", &format!("q{}", i));
            store.push_assistant("p1", &format!("a{}", i));
        }
        let history = store.history("p1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q1");
        assert_eq!(history[3].content, "a2");
    }

    #[test]
    fn buffers_are_isolated_per_participant() {
        let store = SessionStore::new(10);
        store.push_user("alice", "hello");
        let bob = store.push_user("bob", "hi");

        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].content, "hi");
        assert_eq!(store.history("alice").len(), 1);
    }

    #[test]
    fn clear_without_key_resets_everything() {
        let store = SessionStore::new(10);
        store.push_user("alice", "hello");
        store.push_user("bob", "hi");

        store.clear(Some("alice"));
        assert!(store.history("alice").is_empty());
        assert_eq!(store.history("bob").len(), 1);

        store.clear(None);
        assert!(store.history("bob").is_empty());
    }

    #[test]
    fn blank_participant_maps_to_anonymous() {
        assert_eq!(SessionStore::key(None), ANONYMOUS_SESSION);
        assert_eq!(SessionStore::key(Some("  ")), ANONYMOUS_SESSION);
        assert_eq!(SessionStore::key(Some("p7")), "p7");
    }
}
