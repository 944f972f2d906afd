use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::{Error, Result};
use crate::models::{Birthday, BirthdayField, BirthdayId, NewBirthday};

/// Format the date field expects, also used to pre-fill it.
pub(crate) const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
/// `YYYY-MM-DD` never needs more characters than this.
const DATE_INPUT_LEN: usize = 10;

/// Fields of the creation form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum FormField {
    #[default]
    FirstName,
    LastName,
    DateOfBirth,
    Notification,
    Calendar,
}

impl FormField {
    pub(crate) const ALL: [FormField; 5] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::DateOfBirth,
        FormField::Notification,
        FormField::Calendar,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            FormField::FirstName => "First name",
            FormField::LastName => "Last name",
            FormField::DateOfBirth => "Birthday",
            FormField::Notification => "Notify me",
            FormField::Calendar => "Add to calendar",
        }
    }

    /// Row of the field inside the form popup.
    pub(crate) fn index(self) -> usize {
        match self {
            FormField::FirstName => 0,
            FormField::LastName => 1,
            FormField::DateOfBirth => 2,
            FormField::Notification => 3,
            FormField::Calendar => 4,
        }
    }

    fn is_toggle(self) -> bool {
        matches!(self, FormField::Notification | FormField::Calendar)
    }
}

impl From<BirthdayField> for FormField {
    fn from(field: BirthdayField) -> Self {
        match field {
            BirthdayField::FirstName => FormField::FirstName,
            BirthdayField::LastName => FormField::LastName,
            BirthdayField::DateOfBirth => FormField::DateOfBirth,
        }
    }
}

/// Internal representation of the "new birthday" form.
#[derive(Clone, Debug)]
pub(crate) struct BirthdayForm {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    /// Raw `YYYY-MM-DD` text; parsed on save.
    pub(crate) date_of_birth: String,
    pub(crate) notification_enabled: bool,
    pub(crate) add_to_calendar: bool,
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
}

impl BirthdayForm {
    /// Empty names, the date pre-filled with today, both toggles on.
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: today.format(DATE_INPUT_FORMAT).to_string(),
            notification_enabled: true,
            add_to_calendar: true,
            active: FormField::FirstName,
            error: None,
        }
    }

    /// Switch focus to a particular field.
    pub(crate) fn focus(&mut self, field: FormField) {
        self.active = field;
    }

    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % FormField::ALL.len();
        self.active = FormField::ALL[next];
    }

    pub(crate) fn previous_field(&mut self) {
        let len = FormField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.active = FormField::ALL[previous];
    }

    /// Feed a typed character to the active field. Space flips the toggles;
    /// the date field only takes digits and dashes.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            FormField::FirstName => self.first_name.push(ch),
            FormField::LastName => self.last_name.push(ch),
            FormField::DateOfBirth => {
                if !(ch.is_ascii_digit() || ch == '-')
                    || self.date_of_birth.chars().count() >= DATE_INPUT_LEN
                {
                    return false;
                }
                self.date_of_birth.push(ch);
            }
            FormField::Notification | FormField::Calendar => {
                if ch != ' ' {
                    return false;
                }
                self.toggle_active();
            }
        }
        true
    }

    /// Flip the focused toggle. Returns false when a text field has focus.
    pub(crate) fn toggle_active(&mut self) -> bool {
        match self.active {
            FormField::Notification => {
                self.notification_enabled = !self.notification_enabled;
                true
            }
            FormField::Calendar => {
                self.add_to_calendar = !self.add_to_calendar;
                true
            }
            _ => false,
        }
    }

    /// Remove the last character from the active text field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            FormField::FirstName => {
                self.first_name.pop();
            }
            FormField::LastName => {
                self.last_name.pop();
            }
            FormField::DateOfBirth => {
                self.date_of_birth.pop();
            }
            FormField::Notification | FormField::Calendar => {}
        }
    }

    /// Validate the inputs and return a birthday ready for persistence.
    pub(crate) fn parse_inputs(&self, today: NaiveDate) -> Result<NewBirthday> {
        let date_of_birth = NaiveDate::parse_from_str(self.date_of_birth.trim(), DATE_INPUT_FORMAT)
            .map_err(|_| {
                Error::validation(
                    BirthdayField::DateOfBirth,
                    "Birthday must be a valid date written YYYY-MM-DD.",
                )
            })?;

        let new = NewBirthday {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth,
            notification_enabled: self.notification_enabled,
            add_to_calendar: self.add_to_calendar,
        };
        new.validate(today)?;
        Ok(new)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: FormField) -> Line<'static> {
        let is_active = self.active == field;
        let label = Span::raw(format!("{}: ", field.label()));

        if field.is_toggle() {
            let on = match field {
                FormField::Notification => self.notification_enabled,
                _ => self.add_to_calendar,
            };
            let style = if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let mark = if on { "[x]" } else { "[ ]" };
            return Line::from(vec![label, Span::styled(mark.to_string(), style)]);
        }

        let value = match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            _ => &self.date_of_birth,
        };
        let display = if value.is_empty() {
            match field {
                FormField::DateOfBirth => "<YYYY-MM-DD>".to_string(),
                _ => "<required>".to_string(),
            }
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![label, Span::styled(display, style)])
    }

    /// Cursor column offset inside the popup for the active field.
    pub(crate) fn cursor_offset(&self) -> usize {
        let prefix = self.active.label().chars().count() + 2;
        let value_len = match self.active {
            FormField::FirstName => self.first_name.chars().count(),
            FormField::LastName => self.last_name.chars().count(),
            FormField::DateOfBirth => self.date_of_birth.chars().count(),
            FormField::Notification | FormField::Calendar => 1,
        };
        prefix + value_len
    }
}

/// State for confirming the removal of a birthday.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmBirthdayDelete {
    pub(crate) id: BirthdayId,
    pub(crate) name: String,
}

impl ConfirmBirthdayDelete {
    pub(crate) fn from(birthday: &Birthday) -> Self {
        Self {
            id: birthday.id,
            name: birthday.full_name(),
        }
    }
}
