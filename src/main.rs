//! Binary entry point: loads the configuration, opens the birthday database,
//! and either runs the TUI or one of the headless subcommands.
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;

use happy_birthday::calendar::export_ics;
use happy_birthday::logging::init_logging;
use happy_birthday::notify::DesktopSink;
use happy_birthday::ui::format_row;
use happy_birthday::{
    open_database, order_birthdays, run_app, App, AppSettings, Config, LocalNotifier,
    NotificationService, RecordStore, SqliteStore,
};

/// Application name shown on desktop notifications.
const APP_NAME: &str = "Happy Birthday";

#[derive(Parser)]
#[command(name = "happy-birthday")]
#[command(about = "Keep track of birthdays and get reminded on the day")]
struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the database, calendar export and log in this directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every birthday, upcoming first
    List,
    /// Show reminders for birthdays that are due now
    Notify,
    /// Write the birthdays to an .ics calendar file
    Export {
        /// Destination file (defaults to birthdays.ics in the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the exported file with the default calendar application
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    init_logging(&config.log_path()?, &config.log_level)?;

    let db_path = config.db_path()?;
    let conn = Rc::new(
        open_database(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?,
    );
    let store = SqliteStore::new(Rc::clone(&conn));
    let notifier = LocalNotifier::new(Rc::clone(&conn), config.alert_hour)
        .context("failed to load notification settings")?;
    let today = Local::now().date_naive();

    match cli.command {
        None => {
            let birthdays = store.list_all().context("failed to load birthdays")?;
            notifier
                .reschedule_all(&birthdays, today)
                .context("failed to refresh reminders")?;
            notifier
                .deliver_due(Local::now().naive_local(), &DesktopSink::new(APP_NAME))
                .context("failed to deliver reminders")?;

            let settings = AppSettings {
                date_format: config.date_format.clone(),
                calendar_path: config.ics_path()?,
            };
            let mut app = App::new(Box::new(store), Box::new(notifier), settings, today)?;
            run_app(&mut app)
        }
        Some(Commands::List) => {
            let birthdays = store.list_all().context("failed to load birthdays")?;
            if birthdays.is_empty() {
                println!("No birthdays yet.");
            }
            for birthday in order_birthdays(birthdays, today) {
                println!("{}", format_row(&birthday, today, &config.date_format));
            }
            Ok(())
        }
        Some(Commands::Notify) => {
            let birthdays = store.list_all().context("failed to load birthdays")?;
            notifier
                .reschedule_all(&birthdays, today)
                .context("failed to refresh reminders")?;

            let sink = DesktopSink::new(APP_NAME);
            let delivered = notifier
                .deliver_due(Local::now().naive_local(), &sink)
                .context("failed to deliver reminders")?;
            info!(delivered, "notify run finished");
            println!("Delivered {delivered} reminder(s).");
            Ok(())
        }
        Some(Commands::Export { output, open }) => {
            let path = match output {
                Some(path) => path,
                None => config.ics_path()?,
            };
            let birthdays = store.list_all().context("failed to load birthdays")?;
            let count = export_ics(&birthdays, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {count} birthday(s) to {}", path.display());

            if open {
                open::that(&path).with_context(|| format!("failed to open {}", path.display()))?;
            }
            Ok(())
        }
    }
}
