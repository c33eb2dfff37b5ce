//! Run-scoped session and artifact store

use std::{
    collections::HashMap,
    sync::RwLock,
};

use uuid::Uuid;

use crate::protocol::Artifact;

/// Run-scoped store mapping node identity to that node's latest artifacts
///
/// Exactly one writer (the engine, on a node's successful completion) and any
/// number of concurrent readers (template resolution, executors needing
/// upstream context). Writes replace a node's entry wholesale; reads return
/// point-in-time copies, never a partially written list. A node that has not
/// completed yet simply has no entry.
#[derive(Debug)]
pub struct Session {
    run_id: String,
    context_id: String,
    artifacts: RwLock<HashMap<String, Vec<Artifact>>>,
}

impl Session {
    /// Create a fresh session for one run
    pub fn new() -> Self {
        let run_id = format!("run-{}", Uuid::now_v7());
        let context_id = format!("ctx-{}", Uuid::now_v7());
        Self {
            run_id,
            context_id,
            artifacts: RwLock::new(HashMap::new()),
        }
    }

    /// Identifier of the run this session belongs to
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Context identifier grouping all tasks of this run
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Replace a node's artifact list wholesale
    ///
    /// Single-writer: called only by the engine when the node's task reaches
    /// `Completed`.
    pub fn set_artifacts(&self, node_id: impl Into<String>, artifacts: Vec<Artifact>) {
        let mut map = self
            .artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.insert(node_id.into(), artifacts);
    }

    /// Snapshot of one node's latest artifacts
    pub fn get_artifacts(&self, node_id: &str) -> Option<Vec<Artifact>> {
        let map = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(node_id).cloned()
    }

    /// Snapshot of every completed node's artifacts
    pub fn all_artifacts(&self) -> HashMap<String, Vec<Artifact>> {
        let map = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.clone()
    }

    /// First text part of a node's latest artifacts, if any
    pub fn first_text(&self, node_id: &str) -> Option<String> {
        let map = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(node_id)
            .and_then(|artifacts| artifacts.iter().find_map(|a| a.first_text()))
            .map(str::to_string)
    }

    /// First structured data part of a node's latest artifacts, if any
    pub fn first_data(&self, node_id: &str) -> Option<serde_json::Value> {
        let map = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(node_id)
            .and_then(|artifacts| artifacts.iter().find_map(|a| a.first_data()))
            .cloned()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unknown_node_has_no_artifacts() {
        let session = Session::new();
        assert!(session.get_artifacts("missing").is_none());
        assert!(session.first_text("missing").is_none());
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let session = Session::new();
        session.set_artifacts(
            "a",
            vec![
                Artifact::from_text("a-1", "one"),
                Artifact::from_text("a-2", "two"),
            ],
        );
        session.set_artifacts("a", vec![Artifact::from_text("a-3", "three")]);

        let artifacts = session.get_artifacts("a").unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].first_text(), Some("three"));
    }

    #[test]
    fn test_reads_are_snapshots() {
        let session = Session::new();
        session.set_artifacts("a", vec![Artifact::from_text("a-1", "before")]);

        let snapshot = session.get_artifacts("a").unwrap();
        session.set_artifacts("a", vec![Artifact::from_text("a-2", "after")]);

        // The earlier snapshot is unaffected by the later write
        assert_eq!(snapshot[0].first_text(), Some("before"));
        assert_eq!(session.first_text("a").as_deref(), Some("after"));
    }

    #[test]
    fn test_first_data() {
        let session = Session::new();
        session.set_artifacts("a", vec![Artifact::from_data("a-1", json!({"n": 7}))]);
        assert_eq!(session.first_data("a"), Some(json!({"n": 7})));
        assert!(session.first_text("a").is_none());
    }

    #[test]
    fn test_ids_are_distinct_per_session() {
        let s1 = Session::new();
        let s2 = Session::new();
        assert_ne!(s1.run_id(), s2.run_id());
        assert_ne!(s1.context_id(), s2.context_id());
    }
}
