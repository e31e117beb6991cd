// Flag storage port.
//
// The two check-then-act races in the pipeline (duplicate submission,
// double review) are closed at this boundary: insert_pending enforces the
// single-PENDING-per-(reporter, content) invariant and apply_review is a
// conditional update gated on the current status. Adapters must make both
// atomic - a naive read-then-write implementation is incorrect.

use super::flag_models::{Flag, FlagPriority, FlagReason, FlagStatus, NewFlag};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum FlagStoreError {
    /// A PENDING flag already exists for this (reporter, content) pair.
    #[error("Duplicate pending flag")]
    DuplicatePending,
    #[error("Flag not found")]
    NotFound,
    /// The flag exists but its status is no longer reviewable.
    #[error("Flag is not reviewable (status: {current})")]
    NotReviewable { current: FlagStatus },
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Fields a review writes onto a flag. Applied atomically by the store,
/// only while the flag is still PENDING or UNDER_REVIEW.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub status: FlagStatus,
    pub reviewed_by: Option<u64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub requires_legal_review: bool,
    pub review_notes: Option<String>,
    /// Reviewer priority override; None keeps the classifier's priority.
    pub priority: Option<FlagPriority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSortBy {
    CreatedAt,
    SeverityScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filter + pagination for the admin listing endpoint.
#[derive(Debug, Clone)]
pub struct FlagQuery {
    pub status: Option<FlagStatus>,
    pub priority: Option<FlagPriority>,
    pub reason: Option<FlagReason>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: FlagSortBy,
    pub sort_order: SortOrder,
}

impl Default for FlagQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            reason: None,
            page: 1,
            limit: 20,
            sort_by: FlagSortBy::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

/// One page of flags plus the total matching count.
#[derive(Debug, Clone)]
pub struct FlagPage {
    pub flags: Vec<Flag>,
    pub total: u64,
}

#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Insert a new flag as PENDING. Fails with `DuplicatePending` if a
    /// PENDING flag already exists for the same (reporter_id, content_id);
    /// the check and the insert are atomic.
    async fn insert_pending(&self, flag: NewFlag) -> Result<Flag, FlagStoreError>;

    async fn get(&self, flag_id: u64) -> Result<Option<Flag>, FlagStoreError>;

    /// Apply a review transition, conditional on the flag still being in a
    /// reviewable status. Returns the updated flag; a flag that exists but
    /// was already resolved surfaces as `NotReviewable`.
    async fn apply_review(
        &self,
        flag_id: u64,
        update: ReviewUpdate,
    ) -> Result<Flag, FlagStoreError>;

    async fn list(&self, query: FlagQuery) -> Result<FlagPage, FlagStoreError>;

    /// Every flag in the ledger, for on-demand stats aggregation.
    async fn all(&self) -> Result<Vec<Flag>, FlagStoreError>;
}
