// Flag ledger service - core business logic of the moderation pipeline.
//
// This service handles:
// - Flag submission with deduplication and risk classification
// - Automatic enforcement (auto-hide) for high-risk flags
// - The review state machine (approve / reject / escalate)
// - Moderation-action and audit side effects in a fixed order
//
// NO transport dependencies here - just pure domain logic over the ports.

use super::flag_models::{Flag, FlagPriority, FlagReason, FlagStatus, NewFlag};
use super::flag_stats::{self, FlagStats};
use super::flag_store::{FlagPage, FlagQuery, FlagStore, FlagStoreError, ReviewUpdate};
use super::risk;
use crate::core::actions::{
    ActionError, ActionLedger, ActionStore, ModerationAction, ModerationActionType,
    ModerationSeverity, Moderator, NewAction,
};
use crate::core::audit::{AuditEventType, AuditLog, AuditStore, NewAuditEntry};
use crate::core::collaborators::{Authorizer, ContentStore, RequestContext};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("Caller is not a privileged operator")]
    Forbidden,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Content {0} not found")]
    ContentNotFound(u64),

    #[error("Flag not found")]
    FlagNotFound,

    #[error("A pending flag already exists for this content")]
    DuplicateFlag,

    #[error("Flag was already reviewed (status: {current})")]
    AlreadyReviewed { current: FlagStatus },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<FlagStoreError> for FlagError {
    fn from(err: FlagStoreError) -> Self {
        match err {
            FlagStoreError::DuplicatePending => FlagError::DuplicateFlag,
            FlagStoreError::NotFound => FlagError::FlagNotFound,
            FlagStoreError::NotReviewable { current } => FlagError::AlreadyReviewed { current },
            FlagStoreError::Storage(msg) => FlagError::Storage(msg),
        }
    }
}

impl From<ActionError> for FlagError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Storage(msg) => FlagError::Storage(msg),
        }
    }
}

// ============================================================================
// REQUEST / RESULT TYPES
// ============================================================================

/// Caller input for POST /content/{id}/flag.
#[derive(Debug, Clone)]
pub struct SubmitFlag {
    pub reason: FlagReason,
    pub description: String,
    pub evidence: Option<String>,
}

/// The three terminal decisions a reviewer can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    Rejected,
    Escalated,
}

impl ReviewVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewVerdict::Approved => "APPROVED",
            ReviewVerdict::Rejected => "REJECTED",
            ReviewVerdict::Escalated => "ESCALATED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub verdict: ReviewVerdict,
    pub review_notes: Option<String>,
    /// Replaces the flag's priority before severity mapping is applied.
    pub priority_override: Option<FlagPriority>,
}

/// Outcome of a review: the updated flag plus the enforcement action the
/// decision produced, if any.
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub flag: Flag,
    pub action: Option<ModerationAction>,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct FlagService<F, A, U>
where
    F: FlagStore,
    A: ActionStore,
    U: AuditStore + 'static,
{
    store: F,
    actions: ActionLedger<A>,
    audit: AuditLog<U>,
    authorizer: Arc<dyn Authorizer>,
    content: Arc<dyn ContentStore>,
}

impl<F, A, U> FlagService<F, A, U>
where
    F: FlagStore,
    A: ActionStore,
    U: AuditStore + 'static,
{
    pub fn new(
        store: F,
        actions: ActionLedger<A>,
        audit: AuditLog<U>,
        authorizer: Arc<dyn Authorizer>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            store,
            actions,
            audit,
            authorizer,
            content,
        }
    }

    /// Submit a flag against a content item.
    ///
    /// Classifies the report, persists it as PENDING (at most one pending
    /// flag per reporter/content pair), auto-hides high-risk content, and
    /// writes the audit trail last.
    pub async fn submit_flag(
        &self,
        reporter_id: u64,
        content_id: u64,
        submission: SubmitFlag,
        ctx: &RequestContext,
    ) -> Result<Flag, FlagError> {
        if submission.description.trim().is_empty() {
            return Err(FlagError::ValidationFailed(
                "description must not be empty".to_string(),
            ));
        }

        let exists = self
            .content
            .exists(content_id)
            .await
            .map_err(|e| FlagError::Storage(e.to_string()))?;
        if !exists {
            return Err(FlagError::ContentNotFound(content_id));
        }

        let priority = risk::priority_for(submission.reason);
        let severity_score = risk::severity_score(submission.reason, &submission.description);
        let auto_hide = risk::should_auto_hide(submission.reason, priority);
        let now = Utc::now();

        let flag = self
            .store
            .insert_pending(NewFlag {
                content_id,
                reporter_id,
                reason: submission.reason,
                description: submission.description,
                evidence: submission.evidence,
                priority,
                severity_score,
                is_auto_hidden: auto_hide,
                reporter_ip: ctx.ip.clone(),
                reporter_user_agent: ctx.user_agent.clone(),
                created_at: now,
            })
            .await?;

        let mut action_id = None;
        let mut enforcement_error = None;
        if auto_hide {
            // Snapshot failure must not block enforcement; the hide still
            // happens, just with a null snapshot in the metadata.
            let snapshot = match self.content.snapshot(content_id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(content_id, "Content snapshot failed: {err}");
                    None
                }
            };

            // The flag is already committed; an enforcement failure here
            // surfaces to the caller, but only after the audit write below.
            match self
                .actions
                .record(NewAction {
                    action_type: ModerationActionType::ContentHidden,
                    severity: risk::moderation_severity(priority),
                    moderator: Moderator::System,
                    content_id: Some(content_id),
                    flag_id: Some(flag.id),
                    description: format!(
                        "Content auto-hidden on {} flag",
                        flag.reason.as_str()
                    ),
                    justification: Some(
                        "Risk classification met the automatic enforcement threshold".to_string(),
                    ),
                    metadata: json!({
                        "automated_action": true,
                        "severity_score": severity_score,
                        "content_snapshot": snapshot,
                    }),
                    created_at: now,
                })
                .await
            {
                Ok(action) => action_id = Some(action.id),
                Err(err) => {
                    tracing::error!(flag_id = flag.id, "Auto-hide action write failed: {err}");
                    enforcement_error = Some(err);
                }
            }
        }

        // Audit is the last side effect; it retries itself on failure and
        // never unwinds the committed flag.
        self.audit
            .record(NewAuditEntry {
                event_type: AuditEventType::FlagCreated,
                severity: risk::audit_severity(priority),
                user_id: reporter_id,
                description: format!(
                    "Flag {} created for content {} ({})",
                    flag.id,
                    content_id,
                    flag.reason.as_str()
                ),
                metadata: json!({
                    "entity_type": "flag",
                    "entity_id": flag.id,
                    "content_id": content_id,
                    "auto_hidden": auto_hide,
                    "moderation_action_id": action_id,
                    "enforcement_failed": enforcement_error.is_some(),
                }),
                ip: ctx.ip.clone(),
                user_agent: ctx.user_agent.clone(),
                endpoint: ctx.endpoint.clone(),
                method: ctx.method.clone(),
                created_at: now,
            })
            .await;

        if let Some(err) = enforcement_error {
            return Err(err.into());
        }

        tracing::info!(
            flag_id = flag.id,
            content_id,
            reporter_id,
            reason = flag.reason.as_str(),
            priority = flag.priority.as_str(),
            severity_score = flag.severity_score,
            auto_hidden = flag.is_auto_hidden,
            "Flag submitted"
        );

        Ok(flag)
    }

    /// Resolve a flag. Only privileged operators may review, and only
    /// while the flag is still PENDING or UNDER_REVIEW.
    pub async fn review_flag(
        &self,
        reviewer_id: u64,
        flag_id: u64,
        request: ReviewRequest,
        ctx: &RequestContext,
    ) -> Result<ReviewResult, FlagError> {
        let privileged = self
            .authorizer
            .is_privileged(reviewer_id)
            .await
            .map_err(|e| FlagError::Storage(e.to_string()))?;
        if !privileged {
            return Err(FlagError::Forbidden);
        }

        let now = Utc::now();
        let update = match request.verdict {
            ReviewVerdict::Approved => ReviewUpdate {
                status: FlagStatus::Approved,
                reviewed_by: Some(reviewer_id),
                reviewed_at: Some(now),
                escalated_at: None,
                requires_legal_review: false,
                review_notes: request.review_notes.clone(),
                priority: request.priority_override,
            },
            ReviewVerdict::Rejected => ReviewUpdate {
                status: FlagStatus::Rejected,
                reviewed_by: Some(reviewer_id),
                reviewed_at: Some(now),
                escalated_at: None,
                requires_legal_review: false,
                review_notes: request.review_notes.clone(),
                priority: request.priority_override,
            },
            ReviewVerdict::Escalated => ReviewUpdate {
                status: FlagStatus::Escalated,
                reviewed_by: Some(reviewer_id),
                reviewed_at: Some(now),
                escalated_at: Some(now),
                requires_legal_review: true,
                review_notes: request.review_notes.clone(),
                priority: request.priority_override,
            },
        };

        // Conditional transition; a concurrent review loses here with
        // AlreadyReviewed and produces no side effects.
        let flag = self.store.apply_review(flag_id, update).await?;

        // The status transition is already committed; a failed enforcement
        // append surfaces to the caller, but only after the audit write.
        let mut enforcement_error = None;
        let action = match request.verdict {
            ReviewVerdict::Approved => {
                // Hidden is the steady state after approval, whether or not
                // an auto-hide already happened.
                let recorded = self
                    .actions
                    .record(NewAction {
                        action_type: ModerationActionType::ContentHidden,
                        severity: risk::moderation_severity(flag.priority),
                        moderator: Moderator::User(reviewer_id),
                        content_id: Some(flag.content_id),
                        flag_id: Some(flag.id),
                        description: format!(
                            "Content hidden after flag {} was approved",
                            flag.id
                        ),
                        justification: request.review_notes.clone(),
                        metadata: json!({ "automated_action": false }),
                        created_at: now,
                    })
                    .await;
                match recorded {
                    Ok(action) => Some(action),
                    Err(err) => {
                        tracing::error!(flag_id = flag.id, "Approval action write failed: {err}");
                        enforcement_error = Some(err);
                        None
                    }
                }
            }
            ReviewVerdict::Rejected if flag.is_auto_hidden => {
                // Compensating action: reverse the automated enforcement.
                let recorded = self
                    .actions
                    .record(NewAction {
                        action_type: ModerationActionType::ContentRestored,
                        severity: ModerationSeverity::Info,
                        moderator: Moderator::User(reviewer_id),
                        content_id: Some(flag.content_id),
                        flag_id: Some(flag.id),
                        description: format!(
                            "Content restored after flag {} was rejected",
                            flag.id
                        ),
                        justification: request.review_notes.clone(),
                        metadata: json!({ "automated_action": false }),
                        created_at: now,
                    })
                    .await;
                match recorded {
                    Ok(action) => Some(action),
                    Err(err) => {
                        tracing::error!(flag_id = flag.id, "Restore action write failed: {err}");
                        enforcement_error = Some(err);
                        None
                    }
                }
            }
            // Rejected-without-auto-hide and escalation change no content
            // state; escalation defers enforcement to legal review.
            ReviewVerdict::Rejected | ReviewVerdict::Escalated => None,
        };

        self.audit
            .record(NewAuditEntry {
                event_type: AuditEventType::FlagReviewed,
                severity: crate::core::audit::AuditSeverity::Info,
                user_id: reviewer_id,
                description: format!(
                    "Flag {} reviewed: {}",
                    flag.id,
                    request.verdict.as_str()
                ),
                metadata: json!({
                    "entity_type": "flag",
                    "entity_id": flag.id,
                    "content_id": flag.content_id,
                    "decision": request.verdict.as_str(),
                    "moderation_action_id": action.as_ref().map(|a| a.id),
                    "enforcement_failed": enforcement_error.is_some(),
                }),
                ip: ctx.ip.clone(),
                user_agent: ctx.user_agent.clone(),
                endpoint: ctx.endpoint.clone(),
                method: ctx.method.clone(),
                created_at: now,
            })
            .await;

        if let Some(err) = enforcement_error {
            return Err(err.into());
        }

        tracing::info!(
            flag_id = flag.id,
            reviewer_id,
            decision = request.verdict.as_str(),
            status = flag.status.as_str(),
            "Flag reviewed"
        );

        Ok(ReviewResult { flag, action })
    }

    /// Paginated admin listing.
    pub async fn list_flags(
        &self,
        caller_id: u64,
        query: FlagQuery,
    ) -> Result<FlagPage, FlagError> {
        self.require_privileged(caller_id).await?;
        Ok(self.store.list(query).await?)
    }

    /// Single-flag admin read.
    pub async fn get_flag(&self, caller_id: u64, flag_id: u64) -> Result<Flag, FlagError> {
        self.require_privileged(caller_id).await?;
        self.store
            .get(flag_id)
            .await?
            .ok_or(FlagError::FlagNotFound)
    }

    /// Enforcement history for a flag, admin only.
    pub async fn flag_actions(
        &self,
        caller_id: u64,
        flag_id: u64,
    ) -> Result<Vec<ModerationAction>, FlagError> {
        self.require_privileged(caller_id).await?;
        Ok(self.actions.history_for_flag(flag_id).await?)
    }

    /// On-demand rollups over the whole ledger.
    pub async fn stats(&self) -> Result<FlagStats, FlagError> {
        let flags = self.store.all().await?;
        Ok(flag_stats::aggregate(&flags, Utc::now()))
    }

    async fn require_privileged(&self, caller_id: u64) -> Result<(), FlagError> {
        let privileged = self
            .authorizer
            .is_privileged(caller_id)
            .await
            .map_err(|e| FlagError::Storage(e.to_string()))?;
        if privileged {
            Ok(())
        } else {
            Err(FlagError::Forbidden)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
