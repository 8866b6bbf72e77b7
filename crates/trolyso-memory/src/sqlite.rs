//! SQLite conversation history.
//!
//! One row per turn in `conversations(id, user_id, message, bot_response,
//! created_at)`. Each row reads back as a `user` entry followed by a `model`
//! entry.

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use trolyso_core::error::{Result, TroLySoError};
use trolyso_core::traits::HistoryStore;
use trolyso_core::types::{ConversationTurn, HistoryEntry, Role};

fn db_err(e: impl std::fmt::Display) -> TroLySoError {
    TroLySoError::Memory(e.to_string())
}

pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        tracing::info!("💾 History database: {}", path.display());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                message TEXT,
                bot_response TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_user
                ON conversations (user_id, id);",
        )
        .map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn.lock().map_err(db_err)?;
        // Newest first; within a turn the reply sorts after the question.
        let mut stmt = conn
            .prepare(
                "SELECT text, role FROM (
                    SELECT id, 0 AS seq, message AS text, 'user' AS role
                        FROM conversations WHERE user_id = ?1 AND message IS NOT NULL
                    UNION ALL
                    SELECT id, 1 AS seq, bot_response AS text, 'model' AS role
                        FROM conversations WHERE user_id = ?1 AND bot_response IS NOT NULL
                )
                ORDER BY id DESC, seq DESC
                LIMIT ?2",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(rusqlite::params![user_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            let (text, role) = row.map_err(db_err)?;
            entries.push(HistoryEntry {
                role: role.parse::<Role>()?,
                text,
            });
        }
        entries.reverse();
        Ok(entries)
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute(
            "INSERT INTO conversations (user_id, message, bot_response, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                turn.user_id,
                turn.user_message,
                turn.bot_response,
                turn.created_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        tracing::debug!("💾 Conversation saved for {}", turn.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(user: &str, turns: usize) -> SqliteHistory {
        let db = SqliteHistory::in_memory().unwrap();
        for i in 1..=turns {
            db.append(&ConversationTurn::new(user, format!("hỏi {i}"), format!("đáp {i}")))
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_recent_is_oldest_first_and_interleaved() {
        let db = seeded("psid", 2).await;
        let entries = db.recent("psid", 10).await.unwrap();
        assert_eq!(
            entries,
            vec![
                HistoryEntry::user("hỏi 1"),
                HistoryEntry::model("đáp 1"),
                HistoryEntry::user("hỏi 2"),
                HistoryEntry::model("đáp 2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_limit_keeps_newest_entries() {
        let db = seeded("psid", 3).await;
        let entries = db.recent("psid", 3).await.unwrap();
        // An odd limit cuts a turn in half: the oldest kept entry is a reply.
        assert_eq!(
            entries,
            vec![
                HistoryEntry::model("đáp 2"),
                HistoryEntry::user("hỏi 3"),
                HistoryEntry::model("đáp 3"),
            ]
        );
        assert_eq!(db.recent("psid", 10).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let db = seeded("alice", 2).await;
        db.append(&ConversationTurn::new("bob", "chào", "chào bạn"))
            .await
            .unwrap();

        assert_eq!(db.recent("bob", 10).await.unwrap().len(), 2);
        assert!(db.recent("carol", 10).await.unwrap().is_empty());
        assert_eq!(db.recent("alice", 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_zero_limit() {
        let db = seeded("psid", 1).await;
        assert!(db.recent("psid", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let db = SqliteHistory::open(&path).unwrap();
            db.append(&ConversationTurn::new("psid", "VNeID là gì?", "Ứng dụng định danh điện tử."))
                .await
                .unwrap();
        }
        let db = SqliteHistory::open(&path).unwrap();
        let entries = db.recent("psid", 10).await.unwrap();
        assert_eq!(entries[1].text, "Ứng dụng định danh điện tử.");
    }
}
