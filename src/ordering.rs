//! Display order for birthdays and the small date helpers built around it.
//!
//! Birthdays are compared on their position in the yearly cycle only. Anything
//! falling on today or later is "upcoming" and listed first; anything earlier
//! in the year has already passed and goes to the back until it comes round
//! again. Both groups are sorted with a stable sort, so records sharing a day
//! keep the order they were handed in.

use chrono::{Datelike, NaiveDate};

use crate::models::{Birthday, MonthDay};

/// Anything that recurs on a fixed day of the year.
pub trait Anniversary {
    fn month_day(&self) -> MonthDay;
}

impl Anniversary for Birthday {
    fn month_day(&self) -> MonthDay {
        Birthday::month_day(self)
    }
}

impl Anniversary for MonthDay {
    fn month_day(&self) -> MonthDay {
        *self
    }
}

/// Records split around today, each half already sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned<T> {
    pub upcoming: Vec<T>,
    pub past: Vec<T>,
}

/// Split `records` into upcoming and past relative to `today` and sort both
/// halves by (month, day). A birthday on today's date counts as upcoming.
pub fn partition<T: Anniversary>(records: Vec<T>, today: NaiveDate) -> Partitioned<T> {
    let today = MonthDay::of(today);
    let (mut upcoming, mut past): (Vec<T>, Vec<T>) = records
        .into_iter()
        .partition(|record| record.month_day() >= today);

    upcoming.sort_by_key(|record| record.month_day());
    past.sort_by_key(|record| record.month_day());

    Partitioned { upcoming, past }
}

/// Order birthdays so the next one to occur comes first, cycling through the
/// year and ending with the one that most recently passed.
pub fn order_birthdays<T: Anniversary>(records: Vec<T>, today: NaiveDate) -> Vec<T> {
    let Partitioned {
        mut upcoming,
        past,
    } = partition(records, today);
    upcoming.extend(past);
    upcoming
}

/// Whole years elapsed between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - birth.year();
    if MonthDay::of(today) < MonthDay::of(birth) {
        years - 1
    } else {
        years
    }
}

/// The next date, today included, on which `month_day` is celebrated.
///
/// February 29 is observed on March 1 in years without a leap day. Returns
/// `None` only for month/day pairs that exist in no year at all.
pub fn next_occurrence(month_day: MonthDay, today: NaiveDate) -> Option<NaiveDate> {
    match observed_in(month_day, today.year()) {
        Some(date) if date >= today => Some(date),
        _ => observed_in(month_day, today.year() + 1),
    }
}

/// Days from `today` until the next occurrence of `month_day`; zero when it
/// is today.
pub fn days_until(month_day: MonthDay, today: NaiveDate) -> i64 {
    next_occurrence(month_day, today).map_or(0, |date| (date - today).num_days())
}

/// Whether a yearly event on `month_day` should fire on `date`.
pub fn falls_on(month_day: MonthDay, date: NaiveDate) -> bool {
    observed_in(month_day, date.year()) == Some(date)
}

fn observed_in(month_day: MonthDay, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month_day.month, month_day.day).or_else(|| {
        if month_day == MonthDay::new(2, 29) {
            NaiveDate::from_ymd_opt(year, 3, 1)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn birthday(id: i64, month: u32, day: u32) -> Birthday {
        Birthday {
            id,
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            date_of_birth: date(1990, month, day),
            notification_enabled: true,
            add_to_calendar: true,
        }
    }

    fn ids(records: &[Birthday]) -> Vec<i64> {
        records.iter().map(|b| b.id).collect()
    }

    #[test]
    fn todays_birthday_leads_the_upcoming_group() {
        let today = date(2024, 6, 15);
        let records = vec![birthday(3, 6, 14), birthday(2, 6, 16), birthday(1, 6, 15)];

        let ordered = order_birthdays(records, today);

        assert_eq!(ids(&ordered), vec![1, 2, 3]);
    }

    #[test]
    fn wraps_around_the_end_of_the_year() {
        let today = date(2024, 12, 30);
        let x = birthday(1, 1, 5);
        let y = birthday(2, 12, 31);
        let z = birthday(3, 6, 1);

        let ordered = order_birthdays(vec![x, y, z], today);

        assert_eq!(ids(&ordered), vec![2, 1, 3]);
    }

    #[test]
    fn partition_splits_and_sorts_each_half() {
        let today = date(2024, 6, 15);
        let records = vec![
            birthday(1, 12, 1),
            birthday(2, 1, 20),
            birthday(3, 6, 15),
            birthday(4, 3, 3),
            birthday(5, 7, 1),
        ];

        let Partitioned { upcoming, past } = partition(records, today);

        assert_eq!(ids(&upcoming), vec![3, 5, 1]);
        assert_eq!(ids(&past), vec![2, 4]);
    }

    #[test]
    fn same_day_records_keep_input_order() {
        let today = date(2024, 6, 15);
        let records = vec![
            birthday(10, 8, 1),
            birthday(11, 2, 2),
            birthday(12, 8, 1),
            birthday(13, 2, 2),
            birthday(14, 8, 1),
        ];

        let ordered = order_birthdays(records, today);

        assert_eq!(ids(&ordered), vec![10, 12, 14, 11, 13]);
    }

    #[test]
    fn ordering_is_idempotent_and_a_permutation() {
        let today = date(2024, 3, 10);
        let records: Vec<Birthday> = (1..=24)
            .map(|i| birthday(i, (i as u32 * 5) % 12 + 1, (i as u32 * 7) % 28 + 1))
            .collect();

        let once = order_birthdays(records.clone(), today);
        let twice = order_birthdays(once.clone(), today);
        assert_eq!(once, twice);

        let mut sorted_input = ids(&records);
        let mut sorted_output = ids(&once);
        sorted_input.sort_unstable();
        sorted_output.sort_unstable();
        assert_eq!(sorted_input, sorted_output);
    }

    #[test]
    fn upcoming_always_precede_past() {
        let today = date(2024, 9, 1);
        let records: Vec<Birthday> = (1..=12).map(|m| birthday(m as i64, m, 1)).collect();

        let ordered = order_birthdays(records, today);
        let today_md = MonthDay::of(today);
        let first_past = ordered
            .iter()
            .position(|b| b.month_day() < today_md)
            .unwrap();

        assert!(ordered[..first_past].iter().all(|b| b.month_day() >= today_md));
        assert!(ordered[first_past..].iter().all(|b| b.month_day() < today_md));
        assert_eq!(ids(&ordered), vec![9, 10, 11, 12, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn leap_day_sorts_between_february_and_march() {
        let today = date(2023, 1, 1);
        let mut leap = birthday(1, 1, 1);
        leap.date_of_birth = date(1988, 2, 29);
        let records = vec![birthday(2, 3, 1), leap, birthday(3, 2, 28)];

        let ordered = order_birthdays(records, today);

        assert_eq!(ids(&ordered), vec![3, 1, 2]);
    }

    #[test]
    fn leap_day_is_today_on_march_first_of_common_years() {
        let leap_day = MonthDay::new(2, 29);
        let today = date(2023, 3, 1);

        assert!(falls_on(leap_day, today));
        assert_eq!(next_occurrence(leap_day, today), Some(today));
        assert_eq!(days_until(leap_day, today), 0);
        assert_eq!(next_occurrence(leap_day, date(2023, 3, 2)), Some(date(2024, 2, 29)));
        assert_eq!(days_until(leap_day, date(2024, 2, 28)), 1);
    }

    #[test]
    fn orders_plain_month_days() {
        let today = date(2024, 6, 15);
        let ordered = order_birthdays(
            vec![MonthDay::new(6, 14), MonthDay::new(6, 15), MonthDay::new(1, 1)],
            today,
        );
        assert_eq!(
            ordered,
            vec![MonthDay::new(6, 15), MonthDay::new(1, 1), MonthDay::new(6, 14)]
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        let ordered: Vec<Birthday> = order_birthdays(Vec::new(), date(2024, 1, 1));
        assert!(ordered.is_empty());
    }

    #[test]
    fn age_drops_by_one_before_the_birthday() {
        let birth = date(1990, 6, 20);
        assert_eq!(age_on(birth, date(2024, 6, 19)), 33);
        assert_eq!(age_on(birth, date(2024, 6, 20)), 34);
        assert_eq!(age_on(birth, date(2024, 12, 31)), 34);
    }

    #[test]
    fn next_occurrence_rolls_into_next_year() {
        let today = date(2024, 12, 30);
        assert_eq!(
            next_occurrence(MonthDay::new(12, 30), today),
            Some(date(2024, 12, 30))
        );
        assert_eq!(
            next_occurrence(MonthDay::new(1, 5), today),
            Some(date(2025, 1, 5))
        );
        assert_eq!(days_until(MonthDay::new(12, 30), today), 0);
        assert_eq!(days_until(MonthDay::new(1, 5), today), 6);
    }

    #[test]
    fn leap_day_is_observed_on_march_first_in_common_years() {
        let leap_day = MonthDay::new(2, 29);
        assert_eq!(
            next_occurrence(leap_day, date(2023, 2, 10)),
            Some(date(2023, 3, 1))
        );
        assert_eq!(
            next_occurrence(leap_day, date(2024, 2, 10)),
            Some(date(2024, 2, 29))
        );
        assert!(falls_on(leap_day, date(2023, 3, 1)));
        assert!(!falls_on(leap_day, date(2024, 3, 1)));
        assert!(falls_on(MonthDay::new(3, 1), date(2023, 3, 1)));
    }
}
