// Risk classifier - pure, deterministic scoring of incoming flags.
//
// No storage, no I/O. These tables are fixed business rules; every match
// is exhaustive so that adding a reason or priority forces each mapping
// site to be revisited.

use super::flag_models::{FlagPriority, FlagReason};
use crate::core::actions::ModerationSeverity;
use crate::core::audit::AuditSeverity;

const MAX_SEVERITY: u8 = 10;

/// Triage tier for a reason. OTHER, SPAM and MANIPULATED_MEDIA fall into
/// the LOW default bucket.
pub fn priority_for(reason: FlagReason) -> FlagPriority {
    match reason {
        FlagReason::Violence | FlagReason::IllegalContent | FlagReason::HateSpeech => {
            FlagPriority::Critical
        }
        FlagReason::Harassment | FlagReason::PersonalAttack | FlagReason::PrivacyViolation => {
            FlagPriority::High
        }
        FlagReason::FalseInformation
        | FlagReason::Misinformation
        | FlagReason::CopyrightViolation => FlagPriority::Medium,
        FlagReason::ManipulatedMedia | FlagReason::Spam | FlagReason::Other => FlagPriority::Low,
    }
}

/// 0-10 risk estimate: base score per reason plus cumulative keyword
/// boosts from the free-text description, clamped at 10. Base scores are
/// all >= 3 so no floor clamp is needed.
pub fn severity_score(reason: FlagReason, description: &str) -> u8 {
    let base: u8 = match reason {
        FlagReason::Violence | FlagReason::IllegalContent => 10,
        FlagReason::HateSpeech => 9,
        FlagReason::Harassment | FlagReason::PersonalAttack => 8,
        FlagReason::PrivacyViolation => 7,
        FlagReason::FalseInformation | FlagReason::Misinformation => 6,
        FlagReason::CopyrightViolation | FlagReason::ManipulatedMedia => 5,
        FlagReason::Other => 4,
        FlagReason::Spam => 3,
    };

    let text = description.to_lowercase();
    let mut score = base;
    if text.contains("urgent") || text.contains("immediate") {
        score = score.saturating_add(2);
    }
    if text.contains("legal") || text.contains("lawyer") {
        score = score.saturating_add(3);
    }

    score.min(MAX_SEVERITY)
}

/// Whether enforcement happens at submission time, before any review.
///
/// The reason clause is redundant with the priority clause today, but is
/// kept explicit so future priority-table changes cannot silently stop
/// hiding the three critical reasons.
pub fn should_auto_hide(reason: FlagReason, priority: FlagPriority) -> bool {
    matches!(priority, FlagPriority::Critical | FlagPriority::High)
        || matches!(
            reason,
            FlagReason::Violence | FlagReason::IllegalContent | FlagReason::HateSpeech
        )
}

/// Fixed projection of a flag priority onto moderation-action severity.
pub fn moderation_severity(priority: FlagPriority) -> ModerationSeverity {
    match priority {
        FlagPriority::Critical => ModerationSeverity::Critical,
        FlagPriority::High => ModerationSeverity::Severe,
        FlagPriority::Medium => ModerationSeverity::Warning,
        FlagPriority::Low => ModerationSeverity::Info,
    }
}

/// Fixed projection of a flag priority onto audit severity.
pub fn audit_severity(priority: FlagPriority) -> AuditSeverity {
    match priority {
        FlagPriority::Critical => AuditSeverity::Critical,
        FlagPriority::High => AuditSeverity::Error,
        FlagPriority::Medium => AuditSeverity::Warning,
        FlagPriority::Low => AuditSeverity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_REASONS: [FlagReason; 12] = [
        FlagReason::Violence,
        FlagReason::IllegalContent,
        FlagReason::HateSpeech,
        FlagReason::Harassment,
        FlagReason::PersonalAttack,
        FlagReason::PrivacyViolation,
        FlagReason::FalseInformation,
        FlagReason::Misinformation,
        FlagReason::CopyrightViolation,
        FlagReason::ManipulatedMedia,
        FlagReason::Spam,
        FlagReason::Other,
    ];

    #[test]
    fn priority_table() {
        assert_eq!(priority_for(FlagReason::Violence), FlagPriority::Critical);
        assert_eq!(priority_for(FlagReason::IllegalContent), FlagPriority::Critical);
        assert_eq!(priority_for(FlagReason::HateSpeech), FlagPriority::Critical);
        assert_eq!(priority_for(FlagReason::Harassment), FlagPriority::High);
        assert_eq!(priority_for(FlagReason::PersonalAttack), FlagPriority::High);
        assert_eq!(priority_for(FlagReason::PrivacyViolation), FlagPriority::High);
        assert_eq!(priority_for(FlagReason::FalseInformation), FlagPriority::Medium);
        assert_eq!(priority_for(FlagReason::Misinformation), FlagPriority::Medium);
        assert_eq!(priority_for(FlagReason::CopyrightViolation), FlagPriority::Medium);
        assert_eq!(priority_for(FlagReason::ManipulatedMedia), FlagPriority::Low);
        assert_eq!(priority_for(FlagReason::Spam), FlagPriority::Low);
        assert_eq!(priority_for(FlagReason::Other), FlagPriority::Low);
    }

    #[test]
    fn severity_base_scores() {
        assert_eq!(severity_score(FlagReason::Violence, ""), 10);
        assert_eq!(severity_score(FlagReason::IllegalContent, ""), 10);
        assert_eq!(severity_score(FlagReason::HateSpeech, ""), 9);
        assert_eq!(severity_score(FlagReason::Harassment, ""), 8);
        assert_eq!(severity_score(FlagReason::PersonalAttack, ""), 8);
        assert_eq!(severity_score(FlagReason::PrivacyViolation, ""), 7);
        assert_eq!(severity_score(FlagReason::FalseInformation, ""), 6);
        assert_eq!(severity_score(FlagReason::Misinformation, ""), 6);
        assert_eq!(severity_score(FlagReason::CopyrightViolation, ""), 5);
        assert_eq!(severity_score(FlagReason::ManipulatedMedia, ""), 5);
        assert_eq!(severity_score(FlagReason::Spam, ""), 3);
        assert_eq!(severity_score(FlagReason::Other, ""), 4);
    }

    #[test]
    fn severity_keyword_boosts_are_cumulative_and_case_insensitive() {
        assert_eq!(severity_score(FlagReason::Spam, "this is URGENT"), 5);
        assert_eq!(severity_score(FlagReason::Spam, "immediate action"), 5);
        assert_eq!(severity_score(FlagReason::Spam, "my Lawyer will hear"), 6);
        assert_eq!(severity_score(FlagReason::Spam, "urgent legal matter"), 8);
        // Both keywords of the same boost count once.
        assert_eq!(severity_score(FlagReason::Spam, "urgent and immediate"), 5);
    }

    #[test]
    fn severity_clamped_at_ten() {
        // Scenario A: 10 + 2 + 3 clamps to 10.
        assert_eq!(
            severity_score(FlagReason::Violence, "urgent threat, contact our lawyer"),
            10
        );
        for reason in ALL_REASONS {
            let score = severity_score(reason, "urgent immediate legal lawyer");
            assert!(score <= 10, "{reason:?} scored {score}");
        }
    }

    #[test]
    fn classifier_is_deterministic() {
        for reason in ALL_REASONS {
            for description in ["", "urgent", "call my lawyer", "urgent legal"] {
                assert_eq!(priority_for(reason), priority_for(reason));
                assert_eq!(
                    severity_score(reason, description),
                    severity_score(reason, description)
                );
            }
        }
    }

    #[test]
    fn auto_hide_matches_priority_or_critical_reason() {
        for reason in ALL_REASONS {
            let priority = priority_for(reason);
            let expected = matches!(priority, FlagPriority::Critical | FlagPriority::High)
                || matches!(
                    reason,
                    FlagReason::Violence | FlagReason::IllegalContent | FlagReason::HateSpeech
                );
            assert_eq!(should_auto_hide(reason, priority), expected, "{reason:?}");
        }
        // Reason clause holds even if the priority table ever changes.
        assert!(should_auto_hide(FlagReason::Violence, FlagPriority::Low));
    }

    #[test]
    fn severity_mapping_tables() {
        assert_eq!(moderation_severity(FlagPriority::Critical), ModerationSeverity::Critical);
        assert_eq!(moderation_severity(FlagPriority::High), ModerationSeverity::Severe);
        assert_eq!(moderation_severity(FlagPriority::Medium), ModerationSeverity::Warning);
        assert_eq!(moderation_severity(FlagPriority::Low), ModerationSeverity::Info);

        assert_eq!(audit_severity(FlagPriority::Critical), AuditSeverity::Critical);
        assert_eq!(audit_severity(FlagPriority::High), AuditSeverity::Error);
        assert_eq!(audit_severity(FlagPriority::Medium), AuditSeverity::Warning);
        assert_eq!(audit_severity(FlagPriority::Low), AuditSeverity::Info);
    }
}
