// Statistics aggregator - read-only rollups over the flag ledger.
//
// Pure aggregation, computed on demand from the current ledger contents;
// nothing here is cached or stored.

use super::flag_models::Flag;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const RECENT_WINDOW_DAYS: i64 = 7;

/// Per-status counts, explicit so the "statuses sum to total" invariant
/// is visible at the type level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub under_review: u64,
    pub approved: u64,
    pub rejected: u64,
    pub escalated: u64,
}

impl StatusCounts {
    pub fn sum(&self) -> u64 {
        self.pending + self.under_review + self.approved + self.rejected + self.escalated
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagStats {
    pub total: u64,
    pub by_status: StatusCounts,
    pub by_reason: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    /// Flags created within the trailing 7 days.
    pub last_7_days: u64,
    /// approved / total, as a rounded percentage. 0 when the ledger is empty.
    pub approval_rate_pct: u32,
}

pub fn aggregate(flags: &[Flag], now: DateTime<Utc>) -> FlagStats {
    use crate::core::flags::flag_models::FlagStatus;

    let mut by_status = StatusCounts::default();
    let mut by_reason: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_priority: BTreeMap<String, u64> = BTreeMap::new();
    let mut last_7_days = 0u64;

    let window_start = now - Duration::days(RECENT_WINDOW_DAYS);

    for flag in flags {
        match flag.status {
            FlagStatus::Pending => by_status.pending += 1,
            FlagStatus::UnderReview => by_status.under_review += 1,
            FlagStatus::Approved => by_status.approved += 1,
            FlagStatus::Rejected => by_status.rejected += 1,
            FlagStatus::Escalated => by_status.escalated += 1,
        }
        *by_reason.entry(flag.reason.as_str().to_string()).or_insert(0) += 1;
        *by_priority
            .entry(flag.priority.as_str().to_string())
            .or_insert(0) += 1;
        if flag.created_at >= window_start {
            last_7_days += 1;
        }
    }

    let total = flags.len() as u64;
    let approval_rate_pct = if total == 0 {
        0
    } else {
        ((by_status.approved as f64 / total as f64) * 100.0).round() as u32
    };

    FlagStats {
        total,
        by_status,
        by_reason,
        by_priority,
        last_7_days,
        approval_rate_pct,
    }
}
