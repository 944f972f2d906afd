use std::collections::HashSet;
use std::rc::Rc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use crate::db::{get_setting, set_setting};
use crate::error::{Error, Result};
use crate::models::{Birthday, BirthdayId, MonthDay};
use crate::ordering::falls_on;

use super::{Alert, AlertId, AlertMessage, AlertSink, NotificationService, PermissionState};

/// Settings key holding the permission answer.
const PERMISSION_KEY: &str = "notification_permission";

/// Alerts kept in the application database and delivered by `deliver_due`,
/// typically from the `notify` command run by cron or a login hook.
pub struct LocalNotifier {
    conn: Rc<Connection>,
    alert_hour: u32,
    permission: PermissionState,
}

impl LocalNotifier {
    /// Load the stored permission answer. `alert_hour` is the local hour from
    /// which an alert may fire on its day.
    pub fn new(conn: Rc<Connection>, alert_hour: u32) -> Result<Self> {
        let permission = get_setting(&conn, PERMISSION_KEY)?
            .map(|raw| PermissionState::parse(&raw))
            .unwrap_or(PermissionState::Unknown);
        debug!(%permission, alert_hour, "loaded notification permission");

        Ok(Self {
            conn,
            alert_hour,
            permission,
        })
    }

    /// Every stored alert, ordered by id.
    pub fn alerts(&self) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, birthday_id, month, day, title, body, last_fired_year
             FROM alerts
             ORDER BY id",
        )?;

        let alerts = stmt
            .query_map([], |row| {
                Ok(Alert {
                    id: row.get(0)?,
                    birthday_id: row.get(1)?,
                    month_day: MonthDay::new(row.get(2)?, row.get(3)?),
                    title: row.get(4)?,
                    body: row.get(5)?,
                    last_fired_year: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(alerts)
    }

    /// Alerts that should fire at `now`: their day has come, the alert hour
    /// has been reached, and they have not fired yet this year.
    pub fn due_alerts(&self, now: NaiveDateTime) -> Result<Vec<Alert>> {
        if now.hour() < self.alert_hour {
            return Ok(Vec::new());
        }

        let today = now.date();
        let year = today.year();
        Ok(self
            .alerts()?
            .into_iter()
            .filter(|alert| falls_on(alert.month_day, today))
            .filter(|alert| alert.last_fired_year != Some(year))
            .collect())
    }

    /// Show every due alert through `sink` and stamp it as fired for the
    /// year. Alerts the sink fails to show stay due for the next run.
    pub fn deliver_due(&self, now: NaiveDateTime, sink: &dyn AlertSink) -> Result<usize> {
        if !self.permission.is_granted() {
            debug!("notifications not permitted; nothing delivered");
            return Ok(0);
        }

        let year = now.date().year();
        let mut delivered = 0;
        for alert in self.due_alerts(now)? {
            if let Err(err) = sink.show(&alert) {
                warn!(alert = alert.id, error = %err, "failed to show alert");
                continue;
            }
            self.conn.execute(
                "UPDATE alerts SET last_fired_year = ?1 WHERE id = ?2",
                params![year, alert.id],
            )?;
            info!(alert = alert.id, birthday = alert.birthday_id, "delivered alert");
            delivered += 1;
        }

        Ok(delivered)
    }
}

impl NotificationService for LocalNotifier {
    fn permission(&self) -> PermissionState {
        self.permission
    }

    fn resolve_permission(&mut self, granted: bool) -> Result<()> {
        let state = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };
        set_setting(&self.conn, PERMISSION_KEY, state.as_str())?;
        self.permission = state;
        info!(permission = %state, "stored notification permission");
        Ok(())
    }

    fn schedule_yearly_alert(
        &self,
        birthday_id: BirthdayId,
        month_day: MonthDay,
        title: &str,
        body: &str,
    ) -> Result<AlertId> {
        if !self.permission.is_granted() {
            return Err(Error::PermissionDenied);
        }

        self.conn.execute(
            "INSERT INTO alerts (birthday_id, month, day, title, body) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![birthday_id, month_day.month, month_day.day, title, body],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(alert = id, birthday = birthday_id, %month_day, "scheduled yearly alert");
        Ok(id)
    }

    fn cancel_alerts(&self, birthday_id: BirthdayId) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM alerts WHERE birthday_id = ?1",
            params![birthday_id],
        )?;
        if removed > 0 {
            info!(birthday = birthday_id, removed, "cancelled alerts");
        }
        Ok(removed)
    }

    fn reschedule_all(&self, birthdays: &[Birthday], today: NaiveDate) -> Result<usize> {
        if !self.permission.is_granted() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;

        let enabled: HashSet<BirthdayId> = birthdays
            .iter()
            .filter(|birthday| birthday.notification_enabled)
            .map(|birthday| birthday.id)
            .collect();
        let stale: Vec<BirthdayId> = {
            let mut stmt = tx.prepare("SELECT DISTINCT birthday_id FROM alerts")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<BirthdayId>>>()?;
            ids.into_iter().filter(|id| !enabled.contains(id)).collect()
        };
        for id in stale {
            tx.execute("DELETE FROM alerts WHERE birthday_id = ?1", params![id])?;
        }

        let mut scheduled = 0;
        for birthday in birthdays.iter().filter(|b| b.notification_enabled) {
            let message = AlertMessage::for_birthday(birthday, today);
            let month_day = birthday.month_day();
            let updated = tx.execute(
                "UPDATE alerts SET month = ?1, day = ?2, title = ?3, body = ?4
                 WHERE birthday_id = ?5",
                params![
                    month_day.month,
                    month_day.day,
                    message.title,
                    message.body,
                    birthday.id
                ],
            )?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO alerts (birthday_id, month, day, title, body)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        birthday.id,
                        month_day.month,
                        month_day.day,
                        message.title,
                        message.body
                    ],
                )?;
            }
            scheduled += 1;
        }

        tx.commit()?;
        debug!(scheduled, "rescheduled alerts");
        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::db::{open_in_memory, RecordStore, SqliteStore};
    use crate::models::NewBirthday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(hour, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        shown: RefCell<Vec<String>>,
    }

    impl AlertSink for RecordingSink {
        fn show(&self, alert: &Alert) -> Result<()> {
            self.shown.borrow_mut().push(alert.title.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl AlertSink for FailingSink {
        fn show(&self, _alert: &Alert) -> Result<()> {
            Err(Error::Notification("no notification daemon".to_string()))
        }
    }

    fn setup() -> (SqliteStore, LocalNotifier, Rc<Connection>) {
        let conn = Rc::new(open_in_memory().unwrap());
        let store = SqliteStore::new(Rc::clone(&conn));
        let notifier = LocalNotifier::new(Rc::clone(&conn), 10).unwrap();
        (store, notifier, conn)
    }

    #[test]
    fn permission_starts_unknown_and_is_remembered() {
        let (_store, mut notifier, conn) = setup();
        assert_eq!(notifier.permission(), PermissionState::Unknown);
        assert!(notifier.needs_permission_prompt());

        notifier.resolve_permission(true).unwrap();

        let reopened = LocalNotifier::new(conn, 10).unwrap();
        assert_eq!(reopened.permission(), PermissionState::Granted);
        assert!(!reopened.needs_permission_prompt());
    }

    #[test]
    fn scheduling_requires_permission() {
        let (store, mut notifier, _conn) = setup();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();

        let denied = notifier.schedule_yearly_alert(ada.id, ada.month_day(), "t", "b");
        assert!(matches!(denied, Err(Error::PermissionDenied)));

        notifier.resolve_permission(false).unwrap();
        let still_denied = notifier.schedule_yearly_alert(ada.id, ada.month_day(), "t", "b");
        assert!(matches!(still_denied, Err(Error::PermissionDenied)));
        assert!(notifier.alerts().unwrap().is_empty());
    }

    #[test]
    fn deleting_a_birthday_cascades_to_its_alerts() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        notifier
            .schedule_yearly_alert(ada.id, ada.month_day(), "t", "b")
            .unwrap();

        store.delete(ada.id).unwrap();

        assert!(notifier.alerts().unwrap().is_empty());
    }

    #[test]
    fn cancel_only_touches_the_given_birthday() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        let alan = store
            .create(&NewBirthday::new("Alan", "Turing", date(1912, 6, 23)))
            .unwrap();
        notifier
            .schedule_yearly_alert(ada.id, ada.month_day(), "a", "b")
            .unwrap();
        notifier
            .schedule_yearly_alert(alan.id, alan.month_day(), "a", "b")
            .unwrap();

        assert_eq!(notifier.cancel_alerts(ada.id).unwrap(), 1);

        let remaining = notifier.alerts().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].birthday_id, alan.id);
    }

    #[test]
    fn alerts_fire_once_per_year_after_the_alert_hour() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        notifier
            .reschedule_all(&[ada], date(2024, 6, 1))
            .unwrap();
        let sink = RecordingSink::default();

        assert_eq!(notifier.deliver_due(at(2024, 6, 20, 9), &sink).unwrap(), 0);
        assert_eq!(notifier.deliver_due(at(2024, 6, 19, 12), &sink).unwrap(), 0);
        assert_eq!(notifier.deliver_due(at(2024, 6, 20, 10), &sink).unwrap(), 1);
        assert_eq!(notifier.deliver_due(at(2024, 6, 20, 18), &sink).unwrap(), 0);
        assert_eq!(notifier.deliver_due(at(2025, 6, 20, 11), &sink).unwrap(), 1);

        assert_eq!(
            *sink.shown.borrow(),
            vec![
                "Ada Lovelace turns 34!".to_string(),
                "Ada Lovelace turns 34!".to_string()
            ]
        );
    }

    #[test]
    fn failed_delivery_stays_due() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        notifier.reschedule_all(&[ada], date(2024, 6, 1)).unwrap();

        assert_eq!(notifier.deliver_due(at(2024, 6, 20, 12), &FailingSink).unwrap(), 0);
        assert_eq!(notifier.due_alerts(at(2024, 6, 20, 12)).unwrap().len(), 1);
    }

    #[test]
    fn nothing_is_delivered_without_permission() {
        let (store, mut notifier, conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        notifier.reschedule_all(&[ada], date(2024, 6, 1)).unwrap();

        let mut denied = LocalNotifier::new(conn, 10).unwrap();
        denied.resolve_permission(false).unwrap();
        let sink = RecordingSink::default();

        assert_eq!(denied.deliver_due(at(2024, 6, 20, 12), &sink).unwrap(), 0);
        assert!(sink.shown.borrow().is_empty());
    }

    #[test]
    fn reschedule_refreshes_titles_and_drops_disabled_records() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let ada = store
            .create(&NewBirthday::new("Ada", "Lovelace", date(1990, 6, 20)))
            .unwrap();
        let mut quiet = NewBirthday::new("Alan", "Turing", date(1912, 6, 23));
        quiet.notification_enabled = false;
        let alan = store.create(&quiet).unwrap();
        notifier
            .schedule_yearly_alert(alan.id, alan.month_day(), "stale", "stale")
            .unwrap();

        let records = vec![ada.clone(), alan];
        assert_eq!(notifier.reschedule_all(&records, date(2024, 1, 1)).unwrap(), 1);
        assert_eq!(notifier.reschedule_all(&records, date(2025, 1, 1)).unwrap(), 1);

        let alerts = notifier.alerts().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].birthday_id, ada.id);
        assert_eq!(alerts[0].title, "Ada Lovelace turns 35!");
    }

    #[test]
    fn leap_day_alert_fires_on_march_first_in_common_years() {
        let (store, mut notifier, _conn) = setup();
        notifier.resolve_permission(true).unwrap();
        let leap = store
            .create(&NewBirthday::new("Leap", "Ling", date(1988, 2, 29)))
            .unwrap();
        notifier.reschedule_all(&[leap], date(2023, 1, 1)).unwrap();

        assert!(notifier.due_alerts(at(2023, 2, 28, 12)).unwrap().is_empty());
        assert_eq!(notifier.due_alerts(at(2023, 3, 1, 12)).unwrap().len(), 1);
        assert_eq!(notifier.due_alerts(at(2024, 2, 29, 12)).unwrap().len(), 1);
    }
}
