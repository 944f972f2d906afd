//! User configuration at `<config dir>/happy-birthday/config.toml`.
//!
//! Every key is optional; a missing file means defaults. Paths for the
//! database, the exported calendar, and the log file are all derived from the
//! data directory.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{Error, Result};

/// SQLite file name stored inside the data directory.
const DB_FILE_NAME: &str = "birthdays.sqlite";
/// Calendar export written next to the database.
const ICS_FILE_NAME: &str = "birthdays.ics";
const LOG_FILE_NAME: &str = "happy-birthday.log";

fn default_alert_hour() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_date_format() -> String {
    "%d %b".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the database, calendar export, and log live. Defaults to the
    /// platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Local hour (0-23) from which a birthday alert may fire.
    #[serde(default = "default_alert_hour")]
    pub alert_hour: u32,

    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `chrono` format used for dates in the list.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            alert_hour: default_alert_hour(),
            log_level: default_log_level(),
            date_format: default_date_format(),
        }
    }
}

impl Config {
    /// Default location of `config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration. An explicit `path` must exist; the default path is
    /// allowed to be missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(Error::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        Self::parse(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|err| Error::Config(err.to_string()))?;
        if config.alert_hour > 23 {
            return Err(Error::Config(format!(
                "alert_hour must be between 0 and 23, got {}",
                config.alert_hour
            )));
        }
        validate_date_format(&config.date_format)?;
        Ok(config)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| Error::Config("could not locate a data directory".to_string()))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE_NAME))
    }

    pub fn ics_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(ICS_FILE_NAME))
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(LOG_FILE_NAME))
    }
}

/// Render a sample date with `format`. Unknown specifiers and time-of-day
/// fields both fail here instead of panicking later inside `format!`.
fn validate_date_format(format: &str) -> Result<()> {
    let sample = NaiveDate::from_ymd_opt(2000, 1, 31)
        .ok_or_else(|| Error::Config("invalid sample date".to_string()))?;
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(format)).map_err(|_| {
        Error::Config(format!(
            "date_format '{format}' is not a valid date format"
        ))
    })
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "happy-birthday")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.alert_hour, 10);
        assert_eq!(config.date_format, "%d %b");
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::parse(
            r#"
            data_dir = "/tmp/birthdays"
            alert_hour = 8
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.alert_hour, 8);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.db_path().unwrap(),
            PathBuf::from("/tmp/birthdays/birthdays.sqlite")
        );
        assert_eq!(
            config.ics_path().unwrap(),
            PathBuf::from("/tmp/birthdays/birthdays.ics")
        );
    }

    #[test]
    fn rejects_bad_values_and_unknown_keys() {
        assert!(matches!(
            Config::parse("alert_hour = 24"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::parse("alert_minute = 3"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::parse("date_format = \"%d %!\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn date_format_must_only_use_date_fields() {
        for format in ["%H:%M", "%d %b %S", "%Y-%m-%d %z"] {
            let text = format!("date_format = \"{format}\"");
            assert!(
                matches!(Config::parse(&text), Err(Error::Config(_))),
                "{format} should be rejected"
            );
        }

        let config = Config::parse("date_format = \"%A %e %B\"").unwrap();
        assert_eq!(config.date_format, "%A %e %B");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn loads_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "alert_hour = 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.alert_hour, 7);
    }
}
