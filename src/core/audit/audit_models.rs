// Audit log domain models.
//
// One entry per state-changing request, regardless of moderation outcome.
// Entries reference other entities by id only, so audit writes can never
// fail because a referenced row was deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    FlagCreated,
    FlagReviewed,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::FlagCreated => "FLAG_CREATED",
            AuditEventType::FlagReviewed => "FLAG_REVIEWED",
        }
    }
}

impl FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FLAG_CREATED" => Ok(AuditEventType::FlagCreated),
            "FLAG_REVIEWED" => Ok(AuditEventType::FlagReviewed),
            other => Err(format!("unknown audit event type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for AuditSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(AuditSeverity::Info),
            "WARNING" => Ok(AuditSeverity::Warning),
            "ERROR" => Ok(AuditSeverity::Error),
            "CRITICAL" => Ok(AuditSeverity::Critical),
            other => Err(format!("unknown audit severity: {other}")),
        }
    }
}

/// One immutable compliance-trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    /// Actor that triggered the event.
    pub user_id: u64,
    pub description: String,
    /// Entity references (id + type), decision, linked action id.
    pub metadata: serde_json::Value,
    // Request provenance.
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

/// Input to AuditStore::append. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub user_id: u64,
    pub description: String,
    pub metadata: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub created_at: DateTime<Utc>,
}
