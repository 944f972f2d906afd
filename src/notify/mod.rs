//! Yearly birthday alerts.
//!
//! Alerts are stored next to the birthdays they belong to and fire once a
//! year on the birthday's month/day at the configured hour. Scheduling is only
//! allowed after the user granted permission; that answer is asked for once
//! and remembered across runs.

mod desktop;
mod local;

use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{Birthday, BirthdayId, MonthDay};
use crate::ordering::{age_on, next_occurrence};

pub use desktop::DesktopSink;
pub use local::LocalNotifier;

/// Primary key of a scheduled alert.
pub type AlertId = i64;

/// Persisted answer to the one-shot permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Never asked; the UI should prompt.
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PermissionState::Unknown => "unknown",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        }
    }

    pub(crate) fn parse(raw: &str) -> Self {
        match raw {
            "granted" => PermissionState::Granted,
            "denied" => PermissionState::Denied,
            _ => PermissionState::Unknown,
        }
    }

    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled yearly alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: AlertId,
    pub birthday_id: BirthdayId,
    pub month_day: MonthDay,
    pub title: String,
    pub body: String,
    /// Year in which the alert was last shown, so it fires at most once a year.
    pub last_fired_year: Option<i32>,
}

/// Title and body shown for a birthday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    /// The title carries the age the person turns on their next birthday.
    pub fn for_birthday(birthday: &Birthday, today: NaiveDate) -> Self {
        let occurs_on = next_occurrence(birthday.month_day(), today).unwrap_or(today);
        let age = age_on(birthday.date_of_birth, occurs_on);
        Self {
            title: format!("{} turns {age}!", birthday.full_name()),
            body: "Wish them a happy birthday 🥳".to_string(),
        }
    }
}

/// Local notification service consumed by the UI.
pub trait NotificationService {
    fn permission(&self) -> PermissionState;

    /// Complete the permission request with the user's answer and persist it.
    fn resolve_permission(&mut self, granted: bool) -> Result<()>;

    /// Schedule an alert that repeats every year on `month_day`.
    /// Fails with `Error::PermissionDenied` unless permission was granted.
    fn schedule_yearly_alert(
        &self,
        birthday_id: BirthdayId,
        month_day: MonthDay,
        title: &str,
        body: &str,
    ) -> Result<AlertId>;

    /// Drop every alert attached to a birthday, returning how many went away.
    fn cancel_alerts(&self, birthday_id: BirthdayId) -> Result<usize>;

    /// Bring stored alerts in line with `birthdays`: refresh titles so the age
    /// stays current, add missing alerts, drop alerts for disabled records.
    fn reschedule_all(&self, birthdays: &[Birthday], today: NaiveDate) -> Result<usize>;

    /// Whether the one-shot permission prompt still needs to be shown.
    fn needs_permission_prompt(&self) -> bool {
        self.permission() == PermissionState::Unknown
    }
}

/// Where due alerts end up when they fire.
pub trait AlertSink {
    fn show(&self, alert: &Alert) -> Result<()>;
}

/// Schedule the alert for a freshly created birthday. Disabled notifications
/// and a denied permission are skipped silently and yield `None`.
pub fn schedule_for_birthday(
    service: &dyn NotificationService,
    birthday: &Birthday,
    today: NaiveDate,
) -> Result<Option<AlertId>> {
    if !birthday.notification_enabled {
        return Ok(None);
    }

    let message = AlertMessage::for_birthday(birthday, today);
    match service.schedule_yearly_alert(
        birthday.id,
        birthday.month_day(),
        &message.title,
        &message.body,
    ) {
        Ok(id) => Ok(Some(id)),
        Err(Error::PermissionDenied) => Ok(None),
        Err(err) => Err(err),
    }
}
