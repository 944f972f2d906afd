//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay light-weight data holders so other layers can focus on
//! presentation and persistence.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

/// Primary key of a stored birthday (the SQLite rowid).
pub type BirthdayId = i64;

/// Calendar position of a date inside the yearly cycle, year discarded.
///
/// The derived ordering compares `month` first and `day` second, which is the
/// lexicographic order used to split and sort birthdays. February 29 is just
/// `(2, 29)` and needs no special casing when comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// Project a full date onto the yearly cycle.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Fields a birthday can be rejected on. The form maps these back onto its own
/// focus targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BirthdayField {
    FirstName,
    LastName,
    DateOfBirth,
}

/// A stored birthday. Records are created and deleted but never edited in
/// place, so every field is fixed once the row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Birthday {
    /// Primary key from the database. Delete flows bubble it back to the
    /// persistence layer and alerts reference it.
    pub id: BirthdayId,
    pub first_name: String,
    pub last_name: String,
    /// The year only matters for the age shown in alerts and the list.
    pub date_of_birth: NaiveDate,
    pub notification_enabled: bool,
    pub add_to_calendar: bool,
}

impl Birthday {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn month_day(&self) -> MonthDay {
        MonthDay::of(self.date_of_birth)
    }
}

impl fmt::Display for Birthday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Input for a birthday that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBirthday {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub notification_enabled: bool,
    pub add_to_calendar: bool,
}

impl NewBirthday {
    /// Both preferences start enabled, matching the creation form defaults.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            notification_enabled: true,
            add_to_calendar: true,
        }
    }

    /// Check the save-time invariants: trimmed names are non-empty and the
    /// birth date is not after `today`. The first offending field wins so the
    /// form can move focus there.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(Error::validation(
                BirthdayField::FirstName,
                "First name is required.",
            ));
        }
        if self.last_name.trim().is_empty() {
            return Err(Error::validation(
                BirthdayField::LastName,
                "Last name is required.",
            ));
        }
        if self.date_of_birth > today {
            return Err(Error::validation(
                BirthdayField::DateOfBirth,
                "Date of birth cannot be in the future.",
            ));
        }
        Ok(())
    }

    /// Attach the identifier handed out by the store.
    pub fn into_birthday(self, id: BirthdayId) -> Birthday {
        Birthday {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            notification_enabled: self.notification_enabled,
            add_to_calendar: self.add_to_calendar,
        }
    }
}
