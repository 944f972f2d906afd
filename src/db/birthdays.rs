use std::rc::Rc;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Birthday, BirthdayId, NewBirthday};

use super::RecordStore;

/// Storage format for `date_of_birth`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// `RecordStore` backed by the embedded SQLite database. The connection is
/// shared with the notifier so alert rows live next to the birthdays they
/// reference.
pub struct SqliteStore {
    conn: Rc<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Rc<Connection>) -> Self {
        Self { conn }
    }
}

/// Raw row as read from SQLite, before the date is validated.
struct StoredRow {
    id: BirthdayId,
    first_name: String,
    last_name: String,
    date_of_birth: Option<String>,
    notification_enabled: bool,
    add_to_calendar: bool,
}

impl StoredRow {
    fn into_birthday(self) -> Result<Birthday> {
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
            .ok_or(Error::InvalidBirthDate { id: self.id })?;

        Ok(Birthday {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            notification_enabled: self.notification_enabled,
            add_to_calendar: self.add_to_calendar,
        })
    }
}

impl RecordStore for SqliteStore {
    fn create(&self, new: &NewBirthday) -> Result<Birthday> {
        self.conn.execute(
            "INSERT INTO birthdays
                (first_name, last_name, date_of_birth, notification_enabled, add_to_calendar)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.first_name,
                new.last_name,
                new.date_of_birth.format(DATE_FORMAT).to_string(),
                new.notification_enabled,
                new.add_to_calendar,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, "created birthday");
        Ok(new.clone().into_birthday(id))
    }

    /// Remove a birthday row. The schema cascades to `alerts`, so scheduled
    /// alerts disappear with it.
    fn delete(&self, id: BirthdayId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM birthdays WHERE id = ?1", params![id])?;

        if deleted == 0 {
            Err(Error::NotFound(id))
        } else {
            info!(id, "deleted birthday");
            Ok(())
        }
    }

    /// Every stored birthday in insertion order. Display order is decided by
    /// `ordering`, not by the query.
    fn list_all(&self) -> Result<Vec<Birthday>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, first_name, last_name, date_of_birth, notification_enabled, add_to_calendar
             FROM birthdays
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    date_of_birth: row.get(3)?,
                    notification_enabled: row.get(4)?,
                    add_to_calendar: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(StoredRow::into_birthday).collect()
    }
}
