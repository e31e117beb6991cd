// SQLite implementation of FlagStore.
//
// The single-PENDING invariant lives in the schema as a partial unique
// index, and review transitions are conditional updates gated on the
// current status - the zero-rows-affected case is what distinguishes a
// lost race from a missing flag.

use crate::core::flags::{
    Flag, FlagPage, FlagQuery, FlagSortBy, FlagStatus, FlagStore, FlagStoreError, NewFlag,
    ReviewUpdate, SortOrder,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

pub struct SqliteFlagStore {
    pool: Pool<Sqlite>,
}

impl SqliteFlagStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL,
                reporter_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                description TEXT NOT NULL,
                evidence TEXT,
                priority TEXT NOT NULL,
                severity_score INTEGER NOT NULL,
                is_auto_hidden BOOLEAN NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'PENDING',
                requires_legal_review BOOLEAN NOT NULL DEFAULT 0,
                review_notes TEXT,
                reviewed_by INTEGER,
                reviewed_at TEXT,
                escalated_at TEXT,
                reporter_ip TEXT,
                reporter_user_agent TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // One PENDING flag per (reporter, content); the insert path relies
        // on this index rejecting duplicates atomically.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_flags_one_pending
            ON flags(reporter_id, content_id) WHERE status = 'PENDING';
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_flag(row: &SqliteRow) -> Result<Flag, FlagStoreError> {
        let parse = |msg: String| FlagStoreError::Storage(msg);
        Ok(Flag {
            id: row.get::<i64, _>("id") as u64,
            content_id: row.get::<i64, _>("content_id") as u64,
            reporter_id: row.get::<i64, _>("reporter_id") as u64,
            reason: row.get::<String, _>("reason").parse().map_err(parse)?,
            description: row.get("description"),
            evidence: row.get("evidence"),
            priority: row.get::<String, _>("priority").parse().map_err(parse)?,
            severity_score: row.get::<i64, _>("severity_score") as u8,
            is_auto_hidden: row.get("is_auto_hidden"),
            status: row.get::<String, _>("status").parse().map_err(parse)?,
            requires_legal_review: row.get("requires_legal_review"),
            review_notes: row.get("review_notes"),
            reviewed_by: row.get::<Option<i64>, _>("reviewed_by").map(|id| id as u64),
            reviewed_at: row.get::<Option<DateTime<Utc>>, _>("reviewed_at"),
            escalated_at: row.get::<Option<DateTime<Utc>>, _>("escalated_at"),
            reporter_ip: row.get("reporter_ip"),
            reporter_user_agent: row.get("reporter_user_agent"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn order_clause(query: &FlagQuery) -> &'static str {
        match (query.sort_by, query.sort_order) {
            (FlagSortBy::CreatedAt, SortOrder::Asc) => " ORDER BY created_at ASC",
            (FlagSortBy::CreatedAt, SortOrder::Desc) => " ORDER BY created_at DESC",
            (FlagSortBy::SeverityScore, SortOrder::Asc) => {
                " ORDER BY severity_score ASC, created_at ASC"
            }
            (FlagSortBy::SeverityScore, SortOrder::Desc) => {
                " ORDER BY severity_score DESC, created_at DESC"
            }
        }
    }

    fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &'a FlagQuery) {
        let mut prefix = " WHERE ";
        if let Some(status) = query.status {
            builder.push(prefix).push("status = ").push_bind(status.as_str());
            prefix = " AND ";
        }
        if let Some(priority) = query.priority {
            builder
                .push(prefix)
                .push("priority = ")
                .push_bind(priority.as_str());
            prefix = " AND ";
        }
        if let Some(reason) = query.reason {
            builder.push(prefix).push("reason = ").push_bind(reason.as_str());
        }
    }
}

#[async_trait]
impl FlagStore for SqliteFlagStore {
    async fn insert_pending(&self, new: NewFlag) -> Result<Flag, FlagStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO flags (
                content_id, reporter_id, reason, description, evidence,
                priority, severity_score, is_auto_hidden, status,
                reporter_ip, reporter_user_agent, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', ?, ?, ?)
            "#,
        )
        .bind(new.content_id as i64)
        .bind(new.reporter_id as i64)
        .bind(new.reason.as_str())
        .bind(&new.description)
        .bind(&new.evidence)
        .bind(new.priority.as_str())
        .bind(new.severity_score as i64)
        .bind(new.is_auto_hidden)
        .bind(&new.reporter_ip)
        .bind(&new.reporter_user_agent)
        .bind(new.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                FlagStoreError::DuplicatePending
            } else {
                FlagStoreError::Storage(e.to_string())
            }
        })?;

        let id = result.last_insert_rowid() as u64;
        self.get(id)
            .await?
            .ok_or_else(|| FlagStoreError::Storage("inserted flag vanished".to_string()))
    }

    async fn get(&self, flag_id: u64) -> Result<Option<Flag>, FlagStoreError> {
        let row = sqlx::query("SELECT * FROM flags WHERE id = ?")
            .bind(flag_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FlagStoreError::Storage(e.to_string()))?;

        row.as_ref().map(Self::row_to_flag).transpose()
    }

    async fn apply_review(
        &self,
        flag_id: u64,
        update: ReviewUpdate,
    ) -> Result<Flag, FlagStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE flags SET
                status = ?,
                reviewed_by = ?,
                reviewed_at = ?,
                escalated_at = ?,
                requires_legal_review = ?,
                review_notes = ?,
                priority = COALESCE(?, priority)
            WHERE id = ? AND status IN ('PENDING', 'UNDER_REVIEW')
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.reviewed_by.map(|id| id as i64))
        .bind(update.reviewed_at)
        .bind(update.escalated_at)
        .bind(update.requires_legal_review)
        .bind(&update.review_notes)
        .bind(update.priority.map(|p| p.as_str()))
        .bind(flag_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| FlagStoreError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Lost the conditional write: either the flag never existed or
            // another reviewer got there first.
            return match self.get(flag_id).await? {
                Some(flag) => Err(FlagStoreError::NotReviewable {
                    current: flag.status,
                }),
                None => Err(FlagStoreError::NotFound),
            };
        }

        self.get(flag_id)
            .await?
            .ok_or_else(|| FlagStoreError::Storage("updated flag vanished".to_string()))
    }

    async fn list(&self, query: FlagQuery) -> Result<FlagPage, FlagStoreError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM flags");
        Self::push_filters(&mut count, &query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FlagStoreError::Storage(e.to_string()))?;

        let limit = query.limit as i64;
        let offset = (query.page.max(1) as i64 - 1) * limit;

        let mut select = QueryBuilder::new("SELECT * FROM flags");
        Self::push_filters(&mut select, &query);
        select.push(Self::order_clause(&query));
        select.push(" LIMIT ").push_bind(limit);
        select.push(" OFFSET ").push_bind(offset);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FlagStoreError::Storage(e.to_string()))?;

        let flags = rows
            .iter()
            .map(Self::row_to_flag)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlagPage {
            flags,
            total: total as u64,
        })
    }

    async fn all(&self) -> Result<Vec<Flag>, FlagStoreError> {
        let rows = sqlx::query("SELECT * FROM flags ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FlagStoreError::Storage(e.to_string()))?;

        rows.iter().map(Self::row_to_flag).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flags::{FlagPriority, FlagReason};
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteFlagStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.db");
        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap();
        let store = SqliteFlagStore::new(pool);
        store.migrate().await.unwrap();
        (dir, store)
    }

    fn new_flag(reporter_id: u64, content_id: u64, reason: FlagReason) -> NewFlag {
        NewFlag {
            content_id,
            reporter_id,
            reason,
            description: "description".to_string(),
            evidence: Some("https://example.com/evidence".to_string()),
            priority: crate::core::flags::risk::priority_for(reason),
            severity_score: crate::core::flags::risk::severity_score(reason, "description"),
            is_auto_hidden: false,
            reporter_ip: Some("198.51.100.4".to_string()),
            reporter_user_agent: Some("ua".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_read_back_round_trips() {
        let (_dir, store) = store().await;
        let flag = store
            .insert_pending(new_flag(1, 10, FlagReason::Harassment))
            .await
            .unwrap();

        let loaded = store.get(flag.id).await.unwrap().unwrap();
        assert_eq!(loaded.reason, FlagReason::Harassment);
        assert_eq!(loaded.status, FlagStatus::Pending);
        assert_eq!(loaded.reporter_ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(loaded.evidence.as_deref(), Some("https://example.com/evidence"));
    }

    #[tokio::test]
    async fn unique_index_rejects_second_pending_flag() {
        let (_dir, store) = store().await;
        store
            .insert_pending(new_flag(1, 10, FlagReason::Spam))
            .await
            .unwrap();

        let err = store
            .insert_pending(new_flag(1, 10, FlagReason::Spam))
            .await
            .unwrap_err();
        assert!(matches!(err, FlagStoreError::DuplicatePending));

        // Resolving the first frees the slot.
        let flag = store.all().await.unwrap().remove(0);
        store
            .apply_review(
                flag.id,
                ReviewUpdate {
                    status: FlagStatus::Rejected,
                    reviewed_by: Some(900),
                    reviewed_at: Some(Utc::now()),
                    escalated_at: None,
                    requires_legal_review: false,
                    review_notes: None,
                    priority: None,
                },
            )
            .await
            .unwrap();
        store
            .insert_pending(new_flag(1, 10, FlagReason::Spam))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn conditional_update_distinguishes_lost_race_from_missing_flag() {
        let (_dir, store) = store().await;
        let flag = store
            .insert_pending(new_flag(1, 10, FlagReason::Spam))
            .await
            .unwrap();

        let update = ReviewUpdate {
            status: FlagStatus::Approved,
            reviewed_by: Some(900),
            reviewed_at: Some(Utc::now()),
            escalated_at: None,
            requires_legal_review: false,
            review_notes: Some("confirmed".to_string()),
            priority: Some(FlagPriority::Medium),
        };

        let updated = store.apply_review(flag.id, update.clone()).await.unwrap();
        assert_eq!(updated.status, FlagStatus::Approved);
        assert_eq!(updated.priority, FlagPriority::Medium);
        assert_eq!(updated.review_notes.as_deref(), Some("confirmed"));

        let err = store.apply_review(flag.id, update.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            FlagStoreError::NotReviewable {
                current: FlagStatus::Approved
            }
        ));

        let err = store.apply_review(999, update).await.unwrap_err();
        assert!(matches!(err, FlagStoreError::NotFound));
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let (_dir, store) = store().await;
        store.insert_pending(new_flag(1, 10, FlagReason::Spam)).await.unwrap();
        store.insert_pending(new_flag(2, 10, FlagReason::Violence)).await.unwrap();
        store.insert_pending(new_flag(3, 10, FlagReason::Violence)).await.unwrap();

        let violent = store
            .list(FlagQuery {
                reason: Some(FlagReason::Violence),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(violent.total, 2);

        let by_severity = store
            .list(FlagQuery {
                sort_by: FlagSortBy::SeverityScore,
                sort_order: SortOrder::Desc,
                limit: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_severity.total, 3);
        assert_eq!(by_severity.flags.len(), 1);
        assert_eq!(by_severity.flags[0].reason, FlagReason::Violence);
    }
}
