// Moderation action ledger - append-only record of enforcement effects.
//
// Actions are created by the flag submit/review paths as side effects,
// never directly by end users. The store trait deliberately exposes no
// update or delete: append-only is a contract, not a convention.

use super::action_models::{ModerationAction, NewAction};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Append one action and return it with its assigned id.
    async fn append(&self, action: NewAction) -> Result<ModerationAction, ActionError>;

    /// All actions recorded against a flag, oldest first.
    async fn for_flag(&self, flag_id: u64) -> Result<Vec<ModerationAction>, ActionError>;

    /// All actions recorded against a content item, oldest first.
    #[allow(dead_code)]
    async fn for_content(&self, content_id: u64) -> Result<Vec<ModerationAction>, ActionError>;
}

pub struct ActionLedger<S: ActionStore> {
    store: S,
}

impl<S: ActionStore> ActionLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn record(&self, action: NewAction) -> Result<ModerationAction, ActionError> {
        let recorded = self.store.append(action).await?;
        tracing::info!(
            action_id = recorded.id,
            action_type = recorded.action_type.as_str(),
            severity = recorded.severity.as_str(),
            flag_id = recorded.flag_id,
            content_id = recorded.content_id,
            "Moderation action recorded"
        );
        Ok(recorded)
    }

    pub async fn history_for_flag(
        &self,
        flag_id: u64,
    ) -> Result<Vec<ModerationAction>, ActionError> {
        self.store.for_flag(flag_id).await
    }
}
