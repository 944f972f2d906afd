//! Persistence module split across logical submodules.

mod birthdays;
mod connection;
mod settings;

use crate::error::Result;
use crate::models::{Birthday, BirthdayId, NewBirthday};

pub use birthdays::SqliteStore;
pub use connection::{ensure_schema, open_database, open_in_memory};
pub use settings::{get_setting, set_setting};

/// Durable keyed storage for birthdays. The UI only ever holds snapshots
/// returned from `list_all`.
pub trait RecordStore {
    /// Persist a validated birthday and return it with its new identifier.
    fn create(&self, new: &NewBirthday) -> Result<Birthday>;

    /// Delete one birthday; `Error::NotFound` when the id is unknown.
    fn delete(&self, id: BirthdayId) -> Result<()>;

    fn list_all(&self) -> Result<Vec<Birthday>>;
}
