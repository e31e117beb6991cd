// Capability traits for the pipeline's external collaborators.
//
// Authorization policy and content storage live outside this service; the
// pipeline only consumes these narrow contracts. Adapters live in infra/.

use async_trait::async_trait;

/// Answers "is this caller an active privileged operator".
///
/// The pipeline never encodes authorization policy itself - it just asks.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_privileged(&self, caller_id: u64) -> anyhow::Result<bool>;
}

/// Read-only view of the content catalog owned by another service.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether the content item exists (flags must reference real content).
    async fn exists(&self, content_id: u64) -> anyhow::Result<bool>;

    /// Snapshot of the content at hide time, kept in moderation-action
    /// metadata for audit and undo.
    async fn snapshot(&self, content_id: u64) -> anyhow::Result<Option<serde_json::Value>>;
}

/// Request provenance captured at the transport edge.
///
/// Stamped immutably onto flags and audit entries for forensic replay.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub method: String,
}
