use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::calendar::export_ics;
use crate::db::RecordStore;
use crate::error::Error;
use crate::models::Birthday;
use crate::notify::{schedule_for_birthday, NotificationService};

use super::forms::{BirthdayForm, ConfirmBirthdayDelete, FormField};
use super::helpers::{birthday_line, centered_rect, surface_error};
use super::screens::BirthdayList;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the title banner above the list.
const HEADER_HEIGHT: u16 = 4;
const PAGE: isize = 5;

/// Fine-grained modes layered over the list screen.
enum Mode {
    Normal,
    AddingBirthday(BirthdayForm),
    ConfirmDelete(ConfirmBirthdayDelete),
    /// One-shot notification permission prompt shown on first launch.
    AskingPermission,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Presentation settings handed in from the configuration.
pub struct AppSettings {
    /// `chrono` format for the list dates.
    pub date_format: String,
    /// Where the calendar export is written.
    pub calendar_path: PathBuf,
}

/// Central application state shared across the TUI.
pub struct App {
    store: Box<dyn RecordStore>,
    notifier: Box<dyn NotificationService>,
    settings: AppSettings,
    list: BirthdayList,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Load every birthday and decide whether the permission prompt comes
    /// first.
    pub fn new(
        store: Box<dyn RecordStore>,
        notifier: Box<dyn NotificationService>,
        settings: AppSettings,
        today: NaiveDate,
    ) -> Result<Self> {
        let records = store.list_all().context("failed to load birthdays")?;
        let mode = if notifier.needs_permission_prompt() {
            Mode::AskingPermission
        } else {
            Mode::Normal
        };

        Ok(Self {
            store,
            notifier,
            settings,
            list: BirthdayList::new(records, today),
            mode,
            status: None,
        })
    }

    /// Birthdays in display order.
    pub fn birthdays(&self) -> &[Birthday] {
        &self.list.entries
    }

    /// Move the list to a new calendar day, e.g. when the session runs past
    /// midnight.
    pub fn refresh_today(&mut self, today: NaiveDate) {
        self.list.set_today(today);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBirthday(form) => self.handle_add_birthday(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::AskingPermission => self.handle_permission(code, &mut exit)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Down => self.list.move_selection(1),
            KeyCode::PageUp => self.list.move_selection(-PAGE),
            KeyCode::PageDown => self.list.move_selection(PAGE),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Ok(Mode::AddingBirthday(BirthdayForm::new(self.list.today)));
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(birthday) = self.list.current() {
                    let confirm = ConfirmBirthdayDelete::from(birthday);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("No birthday selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('c') | KeyCode::Char('C') => self.export_and_open_calendar(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_birthday(&mut self, code: KeyCode, mut form: BirthdayForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("New birthday cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_birthday(&form) {
                Ok(()) => keep_open = false,
                Err(Error::Validation { field, message }) => {
                    form.focus(FormField::from(field));
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBirthday(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBirthdayDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_delete(&confirm) {
                    self.set_status(err.to_string(), StatusKind::Error);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    /// `q` quits without answering, so the prompt comes back next launch.
    fn handle_permission(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let granted = match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => false,
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                *exit = true;
                return Ok(Mode::AskingPermission);
            }
            _ => return Ok(Mode::AskingPermission),
        };

        if let Err(err) = self.notifier.resolve_permission(granted) {
            self.set_status(err.to_string(), StatusKind::Error);
            return Ok(Mode::Normal);
        }

        if granted {
            match self
                .notifier
                .reschedule_all(&self.list.records, self.list.today)
            {
                Ok(count) => self.set_status(
                    format!("Notifications enabled ({count} scheduled)."),
                    StatusKind::Info,
                ),
                Err(err) => self.set_status(err.to_string(), StatusKind::Error),
            }
        } else {
            self.set_status("Notifications disabled.", StatusKind::Info);
        }
        Ok(Mode::Normal)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_birthday_list(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBirthday(form) => self.draw_birthday_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::AskingPermission => self.draw_permission_prompt(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_birthday_list(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "HAPPY BIRTHDAY",
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(format!(
                "{} birthdays • {} still to come this year",
                self.list.entries.len(),
                self.list.upcoming_count()
            ))),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        if self.list.entries.is_empty() {
            let message = Paragraph::new("No birthdays yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = self
            .list
            .entries
            .iter()
            .enumerate()
            .map(|(idx, birthday)| {
                ListItem::new(birthday_line(
                    birthday,
                    self.list.today,
                    &self.settings.date_format,
                    idx == self.list.selected,
                ))
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Birthdays"));
        let mut state = ListState::default();
        state.select(Some(self.list.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingBirthday(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next field   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Yes   "),
                Span::styled("[N]", key_style),
                Span::raw(" No"),
            ]),
            Mode::AskingPermission => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Allow   "),
                Span::styled("[N]", key_style),
                Span::raw(" Decline   "),
                Span::styled("[Q]", key_style),
                Span::raw(" Quit"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[+]", key_style),
                Span::raw(" New birthday   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[C]", key_style),
                Span::raw(" Calendar   "),
                Span::styled("[Q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_birthday_form(&self, frame: &mut Frame, area: Rect, form: &BirthdayForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("New Birthday").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Space to toggle • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active.index() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBirthdayDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete the birthday of {}?", confirm.name)),
            Line::from("Its notification will be cancelled as well."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_permission_prompt(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Notifications")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from("Allow Happy Birthday to remind you of birthdays?"),
            Line::from("Reminders are shown on the day itself."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to allow, N to decline, or Q to decide next time.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Validate and persist the form. Nothing in memory changes unless the
    /// store accepted the record.
    fn save_new_birthday(&mut self, form: &BirthdayForm) -> crate::error::Result<()> {
        let new = form.parse_inputs(self.list.today)?;
        let birthday = self.store.create(&new)?;

        let mut notes = Vec::new();
        match schedule_for_birthday(&*self.notifier, &birthday, self.list.today) {
            Ok(Some(_)) => notes.push("reminder scheduled"),
            Ok(None) => {}
            Err(err) => {
                warn!(id = birthday.id, error = %err, "failed to schedule reminder");
                notes.push("reminder could not be scheduled");
            }
        }

        let name = birthday.full_name();
        let in_calendar = birthday.add_to_calendar;
        self.list.insert(birthday);
        if in_calendar {
            if self.refresh_calendar() {
                notes.push("calendar updated");
            } else {
                notes.push("calendar export failed");
            }
        }

        let mut message = format!("Added {name}.");
        if !notes.is_empty() {
            message = format!("Added {name} ({}).", notes.join(", "));
        }
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBirthdayDelete) -> crate::error::Result<()> {
        self.store.delete(confirm.id)?;
        if let Err(err) = self.notifier.cancel_alerts(confirm.id) {
            warn!(id = confirm.id, error = %err, "failed to cancel reminder");
        }

        let was_in_calendar = self
            .list
            .records
            .iter()
            .any(|b| b.id == confirm.id && b.add_to_calendar);
        self.list.remove(confirm.id);
        if was_in_calendar {
            // A failed export only leaves a stale .ics behind; already logged.
            self.refresh_calendar();
        }

        self.set_status(format!("Deleted {}.", confirm.name), StatusKind::Info);
        Ok(())
    }

    /// Rewrite the calendar export after the list changed.
    fn refresh_calendar(&self) -> bool {
        match export_ics(&self.list.records, &self.settings.calendar_path) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "failed to refresh calendar export");
                false
            }
        }
    }

    fn export_and_open_calendar(&mut self) {
        let path = self.settings.calendar_path.clone();
        let exported = export_ics(&self.list.records, &path)
            .with_context(|| format!("failed to write {}", path.display()));
        match exported {
            Ok(count) => {
                if let Err(err) = open_link(&path) {
                    self.set_status(
                        format!("Exported {count} birthdays to {} ({err}).", path.display()),
                        StatusKind::Error,
                    );
                } else {
                    info!(path = %path.display(), "opened calendar export");
                    self.set_status(
                        format!("Exported {count} birthdays to your calendar."),
                        StatusKind::Info,
                    );
                }
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }
}
