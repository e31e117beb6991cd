// In-memory implementation of ActionStore, backed by DashMap.

use crate::core::actions::{ActionError, ActionStore, ModerationAction, NewAction};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryActionStore {
    actions: DashMap<u64, ModerationAction>,
    next_id: AtomicU64,
}

impl InMemoryActionStore {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActionStore for InMemoryActionStore {
    async fn append(&self, new: NewAction) -> Result<ModerationAction, ActionError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let action = ModerationAction {
            id,
            action_type: new.action_type,
            severity: new.severity,
            moderator: new.moderator,
            content_id: new.content_id,
            flag_id: new.flag_id,
            description: new.description,
            justification: new.justification,
            metadata: new.metadata,
            created_at: new.created_at,
        };
        self.actions.insert(id, action.clone());
        Ok(action)
    }

    async fn for_flag(&self, flag_id: u64) -> Result<Vec<ModerationAction>, ActionError> {
        let mut actions: Vec<ModerationAction> = self
            .actions
            .iter()
            .filter(|a| a.flag_id == Some(flag_id))
            .map(|a| a.clone())
            .collect();
        actions.sort_by_key(|a| a.id);
        Ok(actions)
    }

    async fn for_content(&self, content_id: u64) -> Result<Vec<ModerationAction>, ActionError> {
        let mut actions: Vec<ModerationAction> = self
            .actions
            .iter()
            .filter(|a| a.content_id == Some(content_id))
            .map(|a| a.clone())
            .collect();
        actions.sort_by_key(|a| a.id);
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::{ModerationActionType, ModerationSeverity, Moderator};
    use chrono::Utc;

    fn hide(flag_id: u64, content_id: u64) -> NewAction {
        NewAction {
            action_type: ModerationActionType::ContentHidden,
            severity: ModerationSeverity::Warning,
            moderator: Moderator::System,
            content_id: Some(content_id),
            flag_id: Some(flag_id),
            description: "hide".to_string(),
            justification: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn history_queries_return_oldest_first() {
        let store = InMemoryActionStore::new();
        store.append(hide(1, 10)).await.unwrap();
        store.append(hide(2, 10)).await.unwrap();
        store.append(hide(1, 11)).await.unwrap();

        let by_flag = store.for_flag(1).await.unwrap();
        assert_eq!(by_flag.len(), 2);
        assert!(by_flag[0].id < by_flag[1].id);

        let by_content = store.for_content(10).await.unwrap();
        assert_eq!(by_content.len(), 2);
        assert_eq!(store.for_flag(99).await.unwrap().len(), 0);
    }
}
