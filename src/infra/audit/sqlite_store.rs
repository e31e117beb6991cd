// SQLite implementation of AuditStore.
//
// Lives in its own table so retention can diverge from the flag and
// action ledgers; compliance entries outlive both.

use crate::core::audit::{AuditEntry, AuditError, AuditStore, NewAuditEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteAuditStore {
    pool: Pool<Sqlite>,
}

impl SqliteAuditStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                metadata TEXT NOT NULL,
                ip TEXT,
                user_agent TEXT,
                endpoint TEXT NOT NULL,
                method TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_entry(row: &SqliteRow) -> Result<AuditEntry, AuditError> {
        let parse = |msg: String| AuditError::Storage(msg);
        Ok(AuditEntry {
            id: row.get::<i64, _>("id") as u64,
            event_type: row.get::<String, _>("event_type").parse().map_err(parse)?,
            severity: row.get::<String, _>("severity").parse().map_err(parse)?,
            user_id: row.get::<i64, _>("user_id") as u64,
            description: row.get("description"),
            metadata: serde_json::from_str(&row.get::<String, _>("metadata"))
                .map_err(|e| AuditError::Storage(e.to_string()))?,
            ip: row.get("ip"),
            user_agent: row.get("user_agent"),
            endpoint: row.get("endpoint"),
            method: row.get("method"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, new: NewAuditEntry) -> Result<AuditEntry, AuditError> {
        let metadata = serde_json::to_string(&new.metadata)
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (
                event_type, severity, user_id, description, metadata,
                ip, user_agent, endpoint, method, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.event_type.as_str())
        .bind(new.severity.as_str())
        .bind(new.user_id as i64)
        .bind(&new.description)
        .bind(metadata)
        .bind(&new.ip)
        .bind(&new.user_agent)
        .bind(&new.endpoint)
        .bind(&new.method)
        .bind(new.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::Storage(e.to_string()))?;

        let row = sqlx::query("SELECT * FROM audit_log WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        Self::row_to_entry(&row)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let rows = sqlx::query("SELECT * FROM audit_log ORDER BY id DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        rows.iter().map(Self::row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::{AuditEventType, AuditSeverity};
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn append_and_recent_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap();
        let store = SqliteAuditStore::new(pool);
        store.migrate().await.unwrap();

        for i in 0..3 {
            store
                .append(NewAuditEntry {
                    event_type: AuditEventType::FlagCreated,
                    severity: AuditSeverity::Warning,
                    user_id: 100 + i,
                    description: format!("flag {i} created"),
                    metadata: serde_json::json!({ "entity_id": i }),
                    ip: Some("203.0.113.9".to_string()),
                    user_agent: None,
                    endpoint: "/content/1/flag".to_string(),
                    method: "POST".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first.
        assert_eq!(recent[0].user_id, 102);
        assert_eq!(recent[0].severity, AuditSeverity::Warning);
        assert_eq!(recent[0].metadata["entity_id"], serde_json::json!(2));
    }
}
