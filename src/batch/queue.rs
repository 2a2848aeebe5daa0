//! Batch queue
//!
//! Ordered newest-first collection of pending credential labels.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::utils::time::now_millis;

/// One queued label. Immutable once created by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLabel {
    id: Uuid,
    username: String,
    password: String,
    /// Creation instant, milliseconds since the UNIX epoch
    timestamp: i64,
}

impl CredentialLabel {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// First 8 hex digits of the id, as shown in the queue list
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Username/password pair read from a batch file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchEntry {
    pub username: String,
    pub password: String,
}

impl BatchEntry {
    /// Load a JSON array of entries
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        let entries: Vec<BatchEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch file {}", path.display()))?;
        Ok(entries)
    }
}

/// Returns true when the value is non-empty after trimming
fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Pending labels, most recently added first
#[derive(Debug, Clone, Default)]
pub struct BatchQueue {
    items: Vec<CredentialLabel>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a new label.
    ///
    /// Ignored when either value is empty or whitespace-only. Values are
    /// stored as typed; the same pair may be queued more than once.
    pub fn add(&mut self, username: &str, password: &str) -> Option<&CredentialLabel> {
        if !is_filled(username) || !is_filled(password) {
            return None;
        }

        let mut id = Uuid::new_v4();
        while self.items.iter().any(|item| item.id == id) {
            id = Uuid::new_v4();
        }

        let label = CredentialLabel {
            id,
            username: username.to_string(),
            password: password.to_string(),
            timestamp: now_millis(),
        };
        debug!("Queued label #{} ({} items)", label.short_id(), self.items.len() + 1);
        self.items.insert(0, label);
        self.items.first()
    }

    /// Remove the label with the given id. Returns false if it was absent.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            debug!("Removed label {} ({} items left)", id, self.items.len());
        }
        removed
    }

    /// Current contents, newest first
    pub fn list(&self) -> &[CredentialLabel] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add entries so that `list()` ends up in the same order as `entries`.
    ///
    /// Returns how many were accepted.
    pub fn import(&mut self, entries: &[BatchEntry]) -> usize {
        entries
            .iter()
            .rev()
            .filter(|entry| self.add(&entry.username, &entry.password).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn pairs(queue: &BatchQueue) -> Vec<(&str, &str)> {
        queue
            .list()
            .iter()
            .map(|item| (item.username(), item.password()))
            .collect()
    }

    #[test]
    fn test_add_prepends() {
        let mut queue = BatchQueue::new();
        queue.add("alice", "pw1");
        queue.add("bob", "pw2");
        assert_eq!(pairs(&queue), vec![("bob", "pw2"), ("alice", "pw1")]);
    }

    #[test]
    fn test_add_ignores_empty_and_whitespace() {
        let mut queue = BatchQueue::new();
        assert!(queue.add("", "pw").is_none());
        assert!(queue.add("user", "").is_none());
        assert!(queue.add("   ", "pw").is_none());
        assert!(queue.add("user", "\t\n").is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_keeps_values_untrimmed() {
        let mut queue = BatchQueue::new();
        let label = queue.add(" alice ", "pw 1").unwrap();
        assert_eq!(label.username(), " alice ");
        assert_eq!(label.password(), "pw 1");
        assert!(label.timestamp() > 0);
    }

    #[test]
    fn test_remove() {
        let mut queue = BatchQueue::new();
        queue.add("alice", "pw1");
        let bob = queue.add("bob", "pw2").unwrap().id();

        assert!(queue.remove(bob));
        assert_eq!(pairs(&queue), vec![("alice", "pw1")]);

        // Second remove is a no-op
        assert!(!queue.remove(bob));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut queue = BatchQueue::new();
        queue.add("alice", "pw1");
        assert!(!queue.remove(Uuid::new_v4()));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ids_are_unique_with_duplicates_allowed() {
        let mut queue = BatchQueue::new();
        for _ in 0..200 {
            queue.add("same", "pair");
        }
        assert_eq!(queue.len(), 200);
        let ids: HashSet<Uuid> = queue.list().iter().map(|item| item.id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_short_id() {
        let mut queue = BatchQueue::new();
        let label = queue.add("alice", "pw1").unwrap();
        let short = label.short_id();
        assert_eq!(short.len(), 8);
        assert!(label.id().simple().to_string().starts_with(&short));
    }

    #[test]
    fn test_import_keeps_file_order() {
        let entries = vec![
            BatchEntry { username: "first".into(), password: "a".into() },
            BatchEntry { username: " ".into(), password: "skipped".into() },
            BatchEntry { username: "second".into(), password: "b".into() },
        ];
        let mut queue = BatchQueue::new();
        assert_eq!(queue.import(&entries), 2);
        assert_eq!(pairs(&queue), vec![("first", "a"), ("second", "b")]);
    }

    #[test]
    fn test_batch_entry_json() {
        let json = r#"[{"username":"alice","password":"pw1"}]"#;
        let entries: Vec<BatchEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[0].password, "pw1");
    }
}
