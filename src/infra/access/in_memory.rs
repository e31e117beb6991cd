// Adapters for the external collaborator traits.
//
// Real deployments put an RBAC service and the content catalog behind
// these; this process ships a static allowlist authorizer and a seedable
// in-memory content view.

use crate::core::collaborators::{Authorizer, ContentStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;

/// Authorizer backed by a fixed set of operator ids (MODERATOR_IDS env).
pub struct StaticAuthorizer {
    privileged: HashSet<u64>,
}

impl StaticAuthorizer {
    #[allow(dead_code)]
    pub fn new(privileged: HashSet<u64>) -> Self {
        Self { privileged }
    }

    /// Parse a comma-separated id list, ignoring blanks and junk.
    pub fn from_csv(csv: &str) -> Self {
        let privileged = csv
            .split(',')
            .filter_map(|part| part.trim().parse::<u64>().ok())
            .collect();
        Self::new(privileged)
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn is_privileged(&self, caller_id: u64) -> anyhow::Result<bool> {
        Ok(self.privileged.contains(&caller_id))
    }
}

/// In-memory stand-in for the content service.
///
/// In permissive mode every content id is considered to exist (for
/// deployments where the upstream gateway already validated the id);
/// snapshots are still only returned for seeded items.
pub struct InMemoryContentStore {
    items: DashMap<u64, serde_json::Value>,
    assume_exists: bool,
}

impl InMemoryContentStore {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            assume_exists: false,
        }
    }

    pub fn permissive() -> Self {
        Self {
            items: DashMap::new(),
            assume_exists: true,
        }
    }

    #[allow(dead_code)]
    pub fn put(&self, content_id: u64, snapshot: serde_json::Value) {
        self.items.insert(content_id, snapshot);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn exists(&self, content_id: u64) -> anyhow::Result<bool> {
        Ok(self.assume_exists || self.items.contains_key(&content_id))
    }

    async fn snapshot(&self, content_id: u64) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.items.get(&content_id).map(|v| v.clone()))
    }
}
