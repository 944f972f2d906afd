use chrono::NaiveDate;

use crate::models::{Birthday, BirthdayId, MonthDay};
use crate::ordering::order_birthdays;

/// The birthday list shown on the main screen.
///
/// `records` keeps store order so ties between same-day birthdays stay stable
/// each time the display order is rebuilt into `entries`.
pub(crate) struct BirthdayList {
    pub(crate) records: Vec<Birthday>,
    pub(crate) entries: Vec<Birthday>,
    pub(crate) selected: usize,
    pub(crate) today: NaiveDate,
}

impl BirthdayList {
    pub(crate) fn new(records: Vec<Birthday>, today: NaiveDate) -> Self {
        let mut list = Self {
            entries: Vec::new(),
            records,
            selected: 0,
            today,
        };
        list.reorder();
        list
    }

    /// Rebuild the display order from the stored records.
    fn reorder(&mut self) {
        self.entries = order_birthdays(self.records.clone(), self.today);
        self.ensure_in_bounds();
    }

    /// Switch to a new reference day, keeping the selected birthday selected.
    pub(crate) fn set_today(&mut self, today: NaiveDate) {
        if today == self.today {
            return;
        }
        let selected = self.current().map(|b| b.id);
        self.today = today;
        self.reorder();
        if let Some(id) = selected {
            self.focus(id);
        }
    }

    /// Add a freshly created birthday and move the selection onto it.
    pub(crate) fn insert(&mut self, birthday: Birthday) {
        let id = birthday.id;
        self.records.push(birthday);
        self.reorder();
        self.focus(id);
    }

    /// Drop a deleted birthday from both orders.
    pub(crate) fn remove(&mut self, id: BirthdayId) {
        self.records.retain(|b| b.id != id);
        self.reorder();
    }

    pub(crate) fn focus(&mut self, id: BirthdayId) {
        if let Some(idx) = self.entries.iter().position(|b| b.id == id) {
            self.selected = idx;
        }
    }

    pub(crate) fn current(&self) -> Option<&Birthday> {
        self.entries.get(self.selected)
    }

    /// Number of leading entries that are still ahead this year.
    pub(crate) fn upcoming_count(&self) -> usize {
        let today = MonthDay::of(self.today);
        self.entries
            .iter()
            .take_while(|b| b.month_day() >= today)
            .count()
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.entries.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.entries.is_empty() {
            self.selected = self.entries.len() - 1;
        }
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.entries.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.entries.len() {
            self.selected = self.entries.len() - 1;
        }
    }
}
