//! Message History Store
//!
//! Every supported bus message is persisted for audit, along with the
//! synthetic error row recorded when a disconnect alert is acknowledged.

use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;

use crate::events::BusMessage;

pub struct MessageStore {
    db_path: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredMessage {
    pub topic: String,
    pub payload: String,
    pub message_id: String,
    pub created_at: String,
}

impl MessageStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        let store = Self { db_path };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT,
                payload TEXT,
                message_id TEXT,
                created_at TEXT
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, message: &BusMessage) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        let created_at = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        conn.execute(
            "INSERT INTO messages (topic, payload, message_id, created_at)
             VALUES (?, ?, ?, ?)",
            (
                &message.topic,
                &message.payload,
                &message.message_id,
                &created_at,
            ),
        )?;
        Ok(())
    }

    /// Newest first
    pub fn latest(&self, limit: u32) -> Result<Vec<StoredMessage>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT topic, payload, message_id, created_at
             FROM messages
             ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(StoredMessage {
                topic: row.get(0)?,
                payload: row.get(1)?,
                message_id: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn clear(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute("DELETE FROM messages", [])?;
        Ok(())
    }
}
