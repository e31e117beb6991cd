// In-memory implementation of AuditStore, backed by DashMap.

use crate::core::audit::{AuditEntry, AuditError, AuditStore, NewAuditEntry};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryAuditStore {
    entries: DashMap<u64, AuditEntry>,
    next_id: AtomicU64,
}

impl InMemoryAuditStore {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, new: NewAuditEntry) -> Result<AuditEntry, AuditError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = AuditEntry {
            id,
            event_type: new.event_type,
            severity: new.severity,
            user_id: new.user_id,
            description: new.description,
            metadata: new.metadata,
            ip: new.ip,
            user_agent: new.user_agent,
            endpoint: new.endpoint,
            method: new.method,
            created_at: new.created_at,
        };
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let mut entries: Vec<AuditEntry> = self.entries.iter().map(|e| e.clone()).collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::{AuditEventType, AuditSeverity};
    use chrono::Utc;

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let store = InMemoryAuditStore::new();
        for i in 0..3 {
            store
                .append(NewAuditEntry {
                    event_type: AuditEventType::FlagCreated,
                    severity: AuditSeverity::Info,
                    user_id: i,
                    description: format!("entry {i}"),
                    metadata: serde_json::json!({}),
                    ip: None,
                    user_agent: None,
                    endpoint: "/content/1/flag".to_string(),
                    method: "POST".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_id, 2);
        assert_eq!(recent[1].user_id, 1);
    }
}
