// Flag domain models - data structures for the trust & safety pipeline.
//
// These are pure domain types with no transport or storage dependencies.
// The api layer converts these to wire DTOs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Flags pending or under review beyond this are considered overdue.
/// The operational SLA for first review; see DESIGN.md.
pub const OVERDUE_AFTER_HOURS: i64 = 72;

/// Why a content item was flagged. Closed set - the reason drives
/// priority, severity and auto-hide, so every variant must be handled
/// exhaustively at those mapping sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagReason {
    Violence,
    IllegalContent,
    HateSpeech,
    Harassment,
    PersonalAttack,
    PrivacyViolation,
    FalseInformation,
    Misinformation,
    CopyrightViolation,
    ManipulatedMedia,
    Spam,
    Other,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::Violence => "VIOLENCE",
            FlagReason::IllegalContent => "ILLEGAL_CONTENT",
            FlagReason::HateSpeech => "HATE_SPEECH",
            FlagReason::Harassment => "HARASSMENT",
            FlagReason::PersonalAttack => "PERSONAL_ATTACK",
            FlagReason::PrivacyViolation => "PRIVACY_VIOLATION",
            FlagReason::FalseInformation => "FALSE_INFORMATION",
            FlagReason::Misinformation => "MISINFORMATION",
            FlagReason::CopyrightViolation => "COPYRIGHT_VIOLATION",
            FlagReason::ManipulatedMedia => "MANIPULATED_MEDIA",
            FlagReason::Spam => "SPAM",
            FlagReason::Other => "OTHER",
        }
    }
}

impl FromStr for FlagReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIOLENCE" => Ok(FlagReason::Violence),
            "ILLEGAL_CONTENT" => Ok(FlagReason::IllegalContent),
            "HATE_SPEECH" => Ok(FlagReason::HateSpeech),
            "HARASSMENT" => Ok(FlagReason::Harassment),
            "PERSONAL_ATTACK" => Ok(FlagReason::PersonalAttack),
            "PRIVACY_VIOLATION" => Ok(FlagReason::PrivacyViolation),
            "FALSE_INFORMATION" => Ok(FlagReason::FalseInformation),
            "MISINFORMATION" => Ok(FlagReason::Misinformation),
            "COPYRIGHT_VIOLATION" => Ok(FlagReason::CopyrightViolation),
            "MANIPULATED_MEDIA" => Ok(FlagReason::ManipulatedMedia),
            "SPAM" => Ok(FlagReason::Spam),
            "OTHER" => Ok(FlagReason::Other),
            other => Err(format!("unknown flag reason: {other}")),
        }
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Escalated,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Pending => "PENDING",
            FlagStatus::UnderReview => "UNDER_REVIEW",
            FlagStatus::Approved => "APPROVED",
            FlagStatus::Rejected => "REJECTED",
            FlagStatus::Escalated => "ESCALATED",
        }
    }

    /// Whether a reviewer may still act on a flag in this state.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, FlagStatus::Pending | FlagStatus::UnderReview)
    }
}

impl FromStr for FlagStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(FlagStatus::Pending),
            "UNDER_REVIEW" => Ok(FlagStatus::UnderReview),
            "APPROVED" => Ok(FlagStatus::Approved),
            "REJECTED" => Ok(FlagStatus::Rejected),
            "ESCALATED" => Ok(FlagStatus::Escalated),
            other => Err(format!("unknown flag status: {other}")),
        }
    }
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage tier derived from the flag's reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl FlagPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagPriority::Low => "LOW",
            FlagPriority::Medium => "MEDIUM",
            FlagPriority::High => "HIGH",
            FlagPriority::Critical => "CRITICAL",
        }
    }
}

impl FromStr for FlagPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(FlagPriority::Low),
            "MEDIUM" => Ok(FlagPriority::Medium),
            "HIGH" => Ok(FlagPriority::High),
            "CRITICAL" => Ok(FlagPriority::Critical),
            other => Err(format!("unknown flag priority: {other}")),
        }
    }
}

impl std::fmt::Display for FlagPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user report that a content item violates policy.
///
/// Created once by the submit path; mutated only by the review path.
/// Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    pub id: u64,
    pub content_id: u64,
    pub reporter_id: u64,
    pub reason: FlagReason,
    pub description: String,
    pub evidence: Option<String>,
    // Derived at creation by the risk classifier, immutable afterwards
    // except for reviewer priority overrides.
    pub priority: FlagPriority,
    pub severity_score: u8,
    pub is_auto_hidden: bool,
    // Review lifecycle.
    pub status: FlagStatus,
    pub requires_legal_review: bool,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<u64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub escalated_at: Option<DateTime<Utc>>,
    // Submission forensics, captured immutably at creation.
    pub reporter_ip: Option<String>,
    pub reporter_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Flag {
    /// Whole days elapsed since the flag was reported.
    pub fn days_since_reported(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Whether the flag has sat unresolved past the review SLA.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_reviewable()
            && now - self.created_at > Duration::hours(OVERDUE_AFTER_HOURS)
    }
}

/// Input to FlagStore::insert_pending. The store assigns the id; status is
/// always PENDING on insert.
#[derive(Debug, Clone)]
pub struct NewFlag {
    pub content_id: u64,
    pub reporter_id: u64,
    pub reason: FlagReason,
    pub description: String,
    pub evidence: Option<String>,
    pub priority: FlagPriority,
    pub severity_score: u8,
    pub is_auto_hidden: bool,
    pub reporter_ip: Option<String>,
    pub reporter_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag_created_at(created_at: DateTime<Utc>, status: FlagStatus) -> Flag {
        Flag {
            id: 1,
            content_id: 10,
            reporter_id: 20,
            reason: FlagReason::Spam,
            description: "spam".to_string(),
            evidence: None,
            priority: FlagPriority::Low,
            severity_score: 3,
            is_auto_hidden: false,
            status,
            requires_legal_review: false,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            escalated_at: None,
            reporter_ip: None,
            reporter_user_agent: None,
            created_at,
        }
    }

    #[test]
    fn overdue_only_while_reviewable() {
        let now = Utc::now();
        let old = now - Duration::hours(OVERDUE_AFTER_HOURS + 1);

        assert!(flag_created_at(old, FlagStatus::Pending).is_overdue(now));
        assert!(flag_created_at(old, FlagStatus::UnderReview).is_overdue(now));
        assert!(!flag_created_at(old, FlagStatus::Approved).is_overdue(now));
        assert!(!flag_created_at(old, FlagStatus::Rejected).is_overdue(now));
        assert!(!flag_created_at(now, FlagStatus::Pending).is_overdue(now));
    }

    #[test]
    fn days_since_reported_floors_at_zero() {
        let now = Utc::now();
        let flag = flag_created_at(now - Duration::days(3), FlagStatus::Pending);
        assert_eq!(flag.days_since_reported(now), 3);

        // Clock skew between writer and reader must not go negative.
        let future = flag_created_at(now + Duration::hours(1), FlagStatus::Pending);
        assert_eq!(future.days_since_reported(now), 0);
    }

    #[test]
    fn enum_round_trips_through_text() {
        for reason in [
            FlagReason::Violence,
            FlagReason::CopyrightViolation,
            FlagReason::Other,
        ] {
            assert_eq!(reason.as_str().parse::<FlagReason>().unwrap(), reason);
        }
        assert_eq!("UNDER_REVIEW".parse::<FlagStatus>().unwrap(), FlagStatus::UnderReview);
        assert!("BANANA".parse::<FlagReason>().is_err());
    }
}
