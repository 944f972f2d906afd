//! Calendar export for birthdays marked "add to calendar". Each one becomes a
//! yearly all-day event in a single `.ics` file the user can import or open.

use std::fs;
use std::path::Path;

use icalendar::{Calendar, Component, EventLike};
use tracing::info;

use crate::error::Result;
use crate::models::Birthday;

/// UID suffix so re-imports update the same events instead of duplicating.
const UID_DOMAIN: &str = "happy-birthday";

/// Render the `.ics` payload for every birthday that opted into the calendar.
pub fn render_ics(birthdays: &[Birthday]) -> String {
    let mut cal = Calendar::new();

    for birthday in birthdays.iter().filter(|b| b.add_to_calendar) {
        let event = icalendar::Event::new()
            .uid(&format!("birthday-{}@{UID_DOMAIN}", birthday.id))
            .summary(&format!("{}'s birthday", birthday.full_name()))
            .all_day(birthday.date_of_birth)
            .add_property("RRULE", "FREQ=YEARLY")
            .add_property("TRANSP", "TRANSPARENT")
            .done();
        cal.push(event);
    }

    cal.done().to_string()
}

/// Write the calendar file, returning how many events it holds.
pub fn export_ics(birthdays: &[Birthday], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let count = birthdays.iter().filter(|b| b.add_to_calendar).count();
    fs::write(path, render_ics(birthdays))?;
    info!(path = %path.display(), count, "exported birthday calendar");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn birthday(id: i64, first: &str, y: i32, m: u32, d: u32, in_calendar: bool) -> Birthday {
        Birthday {
            id,
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            notification_enabled: true,
            add_to_calendar: in_calendar,
        }
    }

    #[test]
    fn only_opted_in_birthdays_are_exported() {
        let ics = render_ics(&[
            birthday(1, "Ada", 1990, 6, 20, true),
            birthday(2, "Alan", 1912, 6, 23, false),
        ]);

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1, "ICS:\n{ics}");
        assert!(ics.contains("Ada Tester's birthday"));
        assert!(!ics.contains("Alan"));
    }

    #[test]
    fn events_are_yearly_all_day_entries_with_stable_uids() {
        let ics = render_ics(&[birthday(7, "Ada", 1990, 6, 20, true)]);

        assert!(
            ics.contains("DTSTART;VALUE=DATE:19900620"),
            "DTSTART should be an all-day date. ICS:\n{ics}"
        );
        assert!(ics.contains("RRULE:FREQ=YEARLY"), "ICS:\n{ics}");
        assert!(ics.contains("UID:birthday-7@happy-birthday"), "ICS:\n{ics}");
    }

    #[test]
    fn export_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("birthdays.ics");

        let count = export_ics(&[birthday(1, "Ada", 1990, 6, 20, true)], &path).unwrap();

        assert_eq!(count, 1);
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("BEGIN:VCALENDAR"));
    }
}
