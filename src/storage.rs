use crate::api::models::{ChatMessage, MessageOrigin};
use directories::ProjectDirs;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no data directory available")]
    NoDataDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn db_path() -> Result<PathBuf, StorageError> {
    let proj = ProjectDirs::from("com", "example", "BrainBotGtk").ok_or(StorageError::NoDataDir)?;
    Ok(proj.data_dir().join("cache.sqlite"))
}

fn open_conn() -> Result<Connection, StorageError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(Connection::open(path)?)
}

// Caching the conversation locally so a freshly opened window has something
// to show before the history fetch returns.
pub fn init() -> Result<(), StorageError> {
    let conn = open_conn()?;
    init_schema(&conn)
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            origin TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            agent TEXT
        );
        "#,
    )?;
    Ok(())
}

/// Replace the cached copy with the server's history.
pub fn replace_history(messages: &[ChatMessage]) -> Result<(), StorageError> {
    let mut conn = open_conn()?;
    replace_history_in(&mut conn, messages)
}

fn replace_history_in(conn: &mut Connection, messages: &[ChatMessage]) -> Result<(), StorageError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM messages", [])?;
    for msg in messages {
        insert_message(&tx, msg)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn append_message(msg: &ChatMessage) -> Result<(), StorageError> {
    let conn = open_conn()?;
    insert_message(&conn, msg)
}

fn insert_message(conn: &Connection, msg: &ChatMessage) -> Result<(), StorageError> {
    // Error rows are one screen's transient feedback, not history.
    if msg.origin == MessageOrigin::Error {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO messages (text, origin, timestamp, agent) VALUES (?1, ?2, ?3, ?4)",
        params![msg.text, msg.origin.as_str(), msg.timestamp, msg.agent],
    )?;
    Ok(())
}

/// The last `limit` cached messages in append order.
pub fn recent_messages(limit: usize) -> Result<Vec<ChatMessage>, StorageError> {
    let conn = open_conn()?;
    recent_messages_in(&conn, limit)
}

fn recent_messages_in(conn: &Connection, limit: usize) -> Result<Vec<ChatMessage>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT text, origin, timestamp, agent FROM messages ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(ChatMessage {
            text: row.get(0)?,
            origin: MessageOrigin::parse(&row.get::<_, String>(1)?)
                .unwrap_or(MessageOrigin::Agent),
            timestamp: row.get(2)?,
            agent: row.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    out.reverse();
    Ok(out)
}
