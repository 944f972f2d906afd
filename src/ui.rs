//! Terminal interface: the birthday list, its popups, and the event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::{App, AppSettings};
pub use helpers::format_row;
pub use terminal::run_app;
