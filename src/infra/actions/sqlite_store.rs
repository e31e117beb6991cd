// SQLite implementation of ActionStore.
//
// Insert-only: the table has no UPDATE or DELETE path through this code.

use crate::core::actions::{
    ActionError, ActionStore, ModerationAction, Moderator, NewAction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteActionStore {
    pool: Pool<Sqlite>,
}

impl SqliteActionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                moderator TEXT NOT NULL,
                content_id INTEGER,
                flag_id INTEGER,
                description TEXT NOT NULL,
                justification TEXT,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_actions_flag ON moderation_actions(flag_id);",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_action(row: &SqliteRow) -> Result<ModerationAction, ActionError> {
        let parse = |msg: String| ActionError::Storage(msg);
        Ok(ModerationAction {
            id: row.get::<i64, _>("id") as u64,
            action_type: row.get::<String, _>("action_type").parse().map_err(parse)?,
            severity: row.get::<String, _>("severity").parse().map_err(parse)?,
            moderator: Moderator::from_store_str(&row.get::<String, _>("moderator"))
                .map_err(parse)?,
            content_id: row.get::<Option<i64>, _>("content_id").map(|id| id as u64),
            flag_id: row.get::<Option<i64>, _>("flag_id").map(|id| id as u64),
            description: row.get("description"),
            justification: row.get("justification"),
            metadata: serde_json::from_str(&row.get::<String, _>("metadata"))
                .map_err(|e| ActionError::Storage(e.to_string()))?,
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[async_trait]
impl ActionStore for SqliteActionStore {
    async fn append(&self, new: NewAction) -> Result<ModerationAction, ActionError> {
        let metadata = serde_json::to_string(&new.metadata)
            .map_err(|e| ActionError::Storage(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO moderation_actions (
                action_type, severity, moderator, content_id, flag_id,
                description, justification, metadata, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.action_type.as_str())
        .bind(new.severity.as_str())
        .bind(new.moderator.as_store_str())
        .bind(new.content_id.map(|id| id as i64))
        .bind(new.flag_id.map(|id| id as i64))
        .bind(&new.description)
        .bind(&new.justification)
        .bind(metadata)
        .bind(new.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ActionError::Storage(e.to_string()))?;

        let row = sqlx::query("SELECT * FROM moderation_actions WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ActionError::Storage(e.to_string()))?;

        Self::row_to_action(&row)
    }

    async fn for_flag(&self, flag_id: u64) -> Result<Vec<ModerationAction>, ActionError> {
        let rows = sqlx::query("SELECT * FROM moderation_actions WHERE flag_id = ? ORDER BY id")
            .bind(flag_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ActionError::Storage(e.to_string()))?;

        rows.iter().map(Self::row_to_action).collect()
    }

    async fn for_content(&self, content_id: u64) -> Result<Vec<ModerationAction>, ActionError> {
        let rows =
            sqlx::query("SELECT * FROM moderation_actions WHERE content_id = ? ORDER BY id")
                .bind(content_id as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ActionError::Storage(e.to_string()))?;

        rows.iter().map(Self::row_to_action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::{ModerationActionType, ModerationSeverity};
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteActionStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.db");
        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap();
        let store = SqliteActionStore::new(pool);
        store.migrate().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn append_preserves_moderator_and_metadata() {
        let (_dir, store) = store().await;

        let action = store
            .append(NewAction {
                action_type: ModerationActionType::ContentHidden,
                severity: ModerationSeverity::Critical,
                moderator: Moderator::System,
                content_id: Some(42),
                flag_id: Some(7),
                description: "auto-hide".to_string(),
                justification: None,
                metadata: serde_json::json!({ "automated_action": true }),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(action.moderator, Moderator::System);

        let history = store.for_flag(7).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].metadata["automated_action"], serde_json::json!(true));

        store
            .append(NewAction {
                action_type: ModerationActionType::ContentRestored,
                severity: ModerationSeverity::Info,
                moderator: Moderator::User(900),
                content_id: Some(42),
                flag_id: Some(7),
                description: "restore".to_string(),
                justification: Some("false positive".to_string()),
                metadata: serde_json::json!({}),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let by_content = store.for_content(42).await.unwrap();
        assert_eq!(by_content.len(), 2);
        assert_eq!(by_content[1].moderator, Moderator::User(900));
    }
}
