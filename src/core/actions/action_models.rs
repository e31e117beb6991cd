// Moderation action domain models.
//
// An action is the record of an enforcement effect (hide/restore) on
// content. The ledger is append-only: history is authoritative and is
// never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What enforcement effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationActionType {
    ContentHidden,
    ContentRestored,
}

impl ModerationActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationActionType::ContentHidden => "CONTENT_HIDDEN",
            ModerationActionType::ContentRestored => "CONTENT_RESTORED",
        }
    }
}

impl FromStr for ModerationActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONTENT_HIDDEN" => Ok(ModerationActionType::ContentHidden),
            "CONTENT_RESTORED" => Ok(ModerationActionType::ContentRestored),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

/// How consequential the action was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationSeverity {
    Info,
    Warning,
    Severe,
    Critical,
}

impl ModerationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationSeverity::Info => "INFO",
            ModerationSeverity::Warning => "WARNING",
            ModerationSeverity::Severe => "SEVERE",
            ModerationSeverity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for ModerationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(ModerationSeverity::Info),
            "WARNING" => Ok(ModerationSeverity::Warning),
            "SEVERE" => Ok(ModerationSeverity::Severe),
            "CRITICAL" => Ok(ModerationSeverity::Critical),
            other => Err(format!("unknown moderation severity: {other}")),
        }
    }
}

/// Who applied the action. Automated enforcement (auto-hide) is recorded
/// against the system actor rather than a fake user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Moderator {
    System,
    User(u64),
}

impl Moderator {
    pub fn as_store_str(&self) -> String {
        match self {
            Moderator::System => "system".to_string(),
            Moderator::User(id) => id.to_string(),
        }
    }

    pub fn from_store_str(s: &str) -> Result<Self, String> {
        if s == "system" {
            return Ok(Moderator::System);
        }
        s.parse::<u64>()
            .map(Moderator::User)
            .map_err(|_| format!("unknown moderator id: {s}"))
    }
}

/// One enforcement effect, tied to the flag and/or content it concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: u64,
    pub action_type: ModerationActionType,
    pub severity: ModerationSeverity,
    pub moderator: Moderator,
    pub content_id: Option<u64>,
    pub flag_id: Option<u64>,
    pub description: String,
    pub justification: Option<String>,
    /// Structured context: `automated_action`, prior content snapshot, etc.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input to ActionStore::append. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub action_type: ModerationActionType,
    pub severity: ModerationSeverity,
    pub moderator: Moderator,
    pub content_id: Option<u64>,
    pub flag_id: Option<u64>,
    pub description: String,
    pub justification: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
