// Audit log - append-only compliance trail of every state-changing event.
//
// Audit completeness ranks below moderation correctness: a failed audit
// write must never fail or roll back the flag write it describes, but it
// also must not be silently dropped. Failed appends are retried on a
// spawned task with backoff until they land, logging each failure.

use super::audit_models::{AuditEntry, NewAuditEntry};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const RETRY_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const RETRY_MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one entry and return it with its assigned id.
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, AuditError>;

    /// Most recent entries, newest first.
    #[allow(dead_code)]
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError>;
}

pub struct AuditLog<S: AuditStore + 'static> {
    store: Arc<S>,
}

impl<S: AuditStore + 'static> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Append an entry, falling back to background retry on failure.
    ///
    /// Always returns Ok from the caller's perspective once the entry is
    /// either written or queued for retry; the flag write this entry
    /// describes has already committed and must not be unwound.
    pub async fn record(&self, entry: NewAuditEntry) {
        match self.store.append(entry.clone()).await {
            Ok(written) => {
                tracing::info!(
                    audit_id = written.id,
                    event_type = written.event_type.as_str(),
                    severity = written.severity.as_str(),
                    user_id = written.user_id,
                    "Audit entry recorded"
                );
            }
            Err(err) => {
                tracing::warn!("Audit write failed, scheduling retry: {err}");
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    let mut backoff = RETRY_INITIAL_BACKOFF;
                    loop {
                        tokio::time::sleep(backoff).await;
                        match store.append(entry.clone()).await {
                            Ok(written) => {
                                tracing::info!(
                                    audit_id = written.id,
                                    event_type = written.event_type.as_str(),
                                    "Audit entry recorded after retry"
                                );
                                break;
                            }
                            Err(err) => {
                                tracing::error!("Audit retry failed, will retry again: {err}");
                                backoff = (backoff * 2).min(RETRY_MAX_BACKOFF);
                            }
                        }
                    }
                });
            }
        }
    }

    #[allow(dead_code)]
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        self.store.recent(limit).await
    }
}
