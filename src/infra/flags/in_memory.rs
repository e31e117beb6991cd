// In-memory implementation of FlagStore, backed by DashMap.
//
// Used by tests and local runs without a database. The single-PENDING
// invariant is enforced through a guard map keyed by (reporter, content);
// the entry API holds the shard lock across the check and the reserve,
// which closes the duplicate-submission race.

use crate::core::flags::{
    Flag, FlagPage, FlagQuery, FlagSortBy, FlagStatus, FlagStore, FlagStoreError, NewFlag,
    ReviewUpdate, SortOrder,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct ReporterContentKey {
    reporter_id: u64,
    content_id: u64,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryFlagStore {
    flags: DashMap<u64, Flag>,
    /// (reporter, content) pairs that currently have a PENDING flag.
    pending: DashMap<ReporterContentKey, u64>,
    next_id: AtomicU64,
}

impl InMemoryFlagStore {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn insert_pending(&self, new: NewFlag) -> Result<Flag, FlagStoreError> {
        let key = ReporterContentKey {
            reporter_id: new.reporter_id,
            content_id: new.content_id,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let flag = Flag {
            id,
            content_id: new.content_id,
            reporter_id: new.reporter_id,
            reason: new.reason,
            description: new.description,
            evidence: new.evidence,
            priority: new.priority,
            severity_score: new.severity_score,
            is_auto_hidden: new.is_auto_hidden,
            status: FlagStatus::Pending,
            requires_legal_review: false,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            escalated_at: None,
            reporter_ip: new.reporter_ip,
            reporter_user_agent: new.reporter_user_agent,
            created_at: new.created_at,
        };

        match self.pending.entry(key) {
            Entry::Occupied(_) => Err(FlagStoreError::DuplicatePending),
            Entry::Vacant(vacant) => {
                self.flags.insert(id, flag.clone());
                vacant.insert(id);
                Ok(flag)
            }
        }
    }

    async fn get(&self, flag_id: u64) -> Result<Option<Flag>, FlagStoreError> {
        Ok(self.flags.get(&flag_id).map(|f| f.clone()))
    }

    async fn apply_review(
        &self,
        flag_id: u64,
        update: ReviewUpdate,
    ) -> Result<Flag, FlagStoreError> {
        // get_mut holds the shard lock, so the status check and the
        // transition are atomic with respect to concurrent reviews.
        let mut entry = self
            .flags
            .get_mut(&flag_id)
            .ok_or(FlagStoreError::NotFound)?;

        if !entry.status.is_reviewable() {
            return Err(FlagStoreError::NotReviewable {
                current: entry.status,
            });
        }

        let was_pending = entry.status == FlagStatus::Pending;
        entry.status = update.status;
        entry.reviewed_by = update.reviewed_by;
        entry.reviewed_at = update.reviewed_at;
        entry.escalated_at = update.escalated_at;
        entry.requires_legal_review = update.requires_legal_review;
        entry.review_notes = update.review_notes;
        if let Some(priority) = update.priority {
            entry.priority = priority;
        }

        let flag = entry.clone();
        drop(entry);

        if was_pending {
            self.pending.remove(&ReporterContentKey {
                reporter_id: flag.reporter_id,
                content_id: flag.content_id,
            });
        }

        Ok(flag)
    }

    async fn list(&self, query: FlagQuery) -> Result<FlagPage, FlagStoreError> {
        let mut flags: Vec<Flag> = self
            .flags
            .iter()
            .map(|f| f.clone())
            .filter(|f| query.status.map_or(true, |s| f.status == s))
            .filter(|f| query.priority.map_or(true, |p| f.priority == p))
            .filter(|f| query.reason.map_or(true, |r| f.reason == r))
            .collect();

        flags.sort_by(|a, b| {
            let ord = match query.sort_by {
                FlagSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
                FlagSortBy::SeverityScore => a
                    .severity_score
                    .cmp(&b.severity_score)
                    .then(a.created_at.cmp(&b.created_at)),
            };
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = flags.len() as u64;
        let offset = (query.page.max(1) as usize - 1) * query.limit as usize;
        let flags = flags
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .collect();

        Ok(FlagPage { flags, total })
    }

    async fn all(&self) -> Result<Vec<Flag>, FlagStoreError> {
        let mut flags: Vec<Flag> = self.flags.iter().map(|f| f.clone()).collect();
        flags.sort_by_key(|f| f.id);
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flags::{FlagPriority, FlagReason};
    use chrono::Utc;

    fn new_flag(reporter_id: u64, content_id: u64) -> NewFlag {
        NewFlag {
            content_id,
            reporter_id,
            reason: FlagReason::Spam,
            description: "spam".to_string(),
            evidence: None,
            priority: FlagPriority::Low,
            severity_score: 3,
            is_auto_hidden: false,
            reporter_ip: None,
            reporter_user_agent: None,
            created_at: Utc::now(),
        }
    }

    fn approve() -> ReviewUpdate {
        ReviewUpdate {
            status: FlagStatus::Approved,
            reviewed_by: Some(1),
            reviewed_at: Some(Utc::now()),
            escalated_at: None,
            requires_legal_review: false,
            review_notes: None,
            priority: None,
        }
    }

    #[tokio::test]
    async fn second_pending_flag_is_a_duplicate() {
        let store = InMemoryFlagStore::new();
        store.insert_pending(new_flag(1, 10)).await.unwrap();

        let err = store.insert_pending(new_flag(1, 10)).await.unwrap_err();
        assert!(matches!(err, FlagStoreError::DuplicatePending));

        // Other pairs are unaffected.
        store.insert_pending(new_flag(2, 10)).await.unwrap();
        store.insert_pending(new_flag(1, 11)).await.unwrap();
        assert_eq!(store.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn resolving_a_flag_frees_the_pending_slot() {
        let store = InMemoryFlagStore::new();
        let flag = store.insert_pending(new_flag(1, 10)).await.unwrap();
        store.apply_review(flag.id, approve()).await.unwrap();

        // The reporter can flag the same content again later.
        store.insert_pending(new_flag(1, 10)).await.unwrap();
    }

    #[tokio::test]
    async fn review_is_conditional_on_status() {
        let store = InMemoryFlagStore::new();
        let flag = store.insert_pending(new_flag(1, 10)).await.unwrap();

        store.apply_review(flag.id, approve()).await.unwrap();
        let err = store.apply_review(flag.id, approve()).await.unwrap_err();
        assert!(matches!(
            err,
            FlagStoreError::NotReviewable {
                current: FlagStatus::Approved
            }
        ));

        let err = store.apply_review(999, approve()).await.unwrap_err();
        assert!(matches!(err, FlagStoreError::NotFound));
    }

    #[tokio::test]
    async fn concurrent_submissions_yield_exactly_one_pending_flag() {
        let store = std::sync::Arc::new(InMemoryFlagStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_pending(new_flag(7, 70)).await
            }));
        }

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(FlagStoreError::DuplicatePending) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let store = InMemoryFlagStore::new();
        for reporter in 1..=5 {
            store.insert_pending(new_flag(reporter, 10)).await.unwrap();
        }

        let page = store
            .list(FlagQuery {
                limit: 2,
                page: 2,
                sort_by: FlagSortBy::CreatedAt,
                sort_order: SortOrder::Asc,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.flags.len(), 2);
        assert_eq!(page.flags[0].reporter_id, 3);

        let none = store
            .list(FlagQuery {
                status: Some(FlagStatus::Approved),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.total, 0);
    }
}
