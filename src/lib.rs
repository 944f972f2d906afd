//! Library surface for the Happy Birthday tracker.
//!
//! The binary drives everything through these modules, and the `list`,
//! `notify` and `export` subcommands reuse them without the TUI.
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod ordering;
pub mod ui;

pub use config::Config;
pub use db::{open_database, RecordStore, SqliteStore};
pub use error::{Error, Result};
pub use models::{Birthday, BirthdayId, MonthDay, NewBirthday};
pub use notify::{LocalNotifier, NotificationService};
pub use ordering::{age_on, order_birthdays};
pub use ui::{run_app, App, AppSettings};
