//! Database Connection and Setup
//!
//! Opens the SQLite database and runs migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Database state wrapper
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    /// Shared handle to the connection for store construction
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

/// Initialize database with path
pub fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Internal(e.to_string()))?;
    run_migrations(&conn)?;
    Ok(DbState {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Initialize an in-memory database (tests)
pub fn init_db_in_memory() -> DomainResult<DbState> {
    let conn = Connection::open_in_memory().map_err(|e| DomainError::Internal(e.to_string()))?;
    run_migrations(&conn)?;
    Ok(DbState {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        r#"CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY,
            widget_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'not_started',
            "order" REAL NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            fail_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER,
            updated_at INTEGER
        )"#,
        [],
    )
    .map_err(|e| DomainError::Internal(e.to_string()))?;

    conn.execute(
        r#"CREATE TABLE IF NOT EXISTS micro_tasks (
            id TEXT PRIMARY KEY,
            widget_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            "order" REAL NOT NULL DEFAULT 0,
            timer_state TEXT NOT NULL DEFAULT 'never',
            total_seconds INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER,
            updated_at INTEGER
        )"#,
        [],
    )
    .map_err(|e| DomainError::Internal(e.to_string()))?;

    // Added after the first release: success streak timestamp
    if !column_exists(conn, "habits", "success_updated_at") {
        conn.execute("ALTER TABLE habits ADD COLUMN success_updated_at INTEGER", [])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
    }

    // Added after the first release: running timer origin
    if !column_exists(conn, "micro_tasks", "last_started_at") {
        conn.execute(
            "ALTER TABLE micro_tasks ADD COLUMN last_started_at INTEGER",
            [],
        )
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    }

    // Soft archival: archived tasks are hidden from lists, not deleted
    if !column_exists(conn, "micro_tasks", "archived_at") {
        conn.execute("ALTER TABLE micro_tasks ADD COLUMN archived_at INTEGER", [])
            .map_err(|e| DomainError::Internal(e.to_string()))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_widget ON habits (widget_id)",
        [],
    )
    .map_err(|e| DomainError::Internal(e.to_string()))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_micro_tasks_widget ON micro_tasks (widget_id)",
        [],
    )
    .map_err(|e| DomainError::Internal(e.to_string()))?;

    Ok(())
}
