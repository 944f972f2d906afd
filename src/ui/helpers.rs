use anyhow::Error;
use chrono::NaiveDate;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Birthday;
use crate::ordering::{age_on, days_until, next_occurrence};

/// "today", "tomorrow", or "in N days" for the next occurrence.
pub(crate) fn describe_when(birthday: &Birthday, today: NaiveDate) -> String {
    match days_until(birthday.month_day(), today) {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        days => format!("in {days} days"),
    }
}

/// Age the person turns on their next birthday.
pub(crate) fn turning_age(birthday: &Birthday, today: NaiveDate) -> i32 {
    let occurs_on = next_occurrence(birthday.month_day(), today).unwrap_or(today);
    age_on(birthday.date_of_birth, occurs_on)
}

/// Plain-text row used by the `list` command: `dd Mon - First Last (when, turns N)`.
pub fn format_row(birthday: &Birthday, today: NaiveDate, date_format: &str) -> String {
    format!(
        "{} - {} ({}, turns {})",
        birthday.date_of_birth.format(date_format),
        birthday.full_name(),
        describe_when(birthday, today),
        turning_age(birthday, today)
    )
}

/// Styled list row. Today's birthdays are highlighted and the selected row is
/// rendered bold.
pub(crate) fn birthday_line(
    birthday: &Birthday,
    today: NaiveDate,
    date_format: &str,
    selected: bool,
) -> Line<'static> {
    let when = describe_when(birthday, today);
    let is_today = days_until(birthday.month_day(), today) == 0;

    let mut name_style = if is_today {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default()
    };
    if selected {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    let marker = if selected { "> " } else { "  " };

    Line::from(vec![
        Span::styled(marker.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("{}", birthday.date_of_birth.format(date_format)),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" - "),
        Span::styled(birthday.full_name(), name_style),
        Span::styled(
            format!("   {when} · turns {}", turning_age(birthday, today)),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
