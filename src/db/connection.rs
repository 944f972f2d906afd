use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// Open (or create) the SQLite database at `path`, run lazy migrations, and
/// return a live connection. The parent directory is created on demand.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    debug!(path = %path.display(), "opened birthday database");
    Ok(conn)
}

/// In-memory database with the full schema. Used by tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the tables if they do not exist yet. The function also toggles
/// `PRAGMA foreign_keys = ON` so deleting a birthday cascades to its alerts.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS birthdays (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            notification_enabled INTEGER NOT NULL DEFAULT 1,
            add_to_calendar INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            birthday_id INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            last_fired_year INTEGER,
            FOREIGN KEY(birthday_id) REFERENCES birthdays(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
