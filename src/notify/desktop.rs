use notify_rust::Notification;

use crate::error::{Error, Result};

use super::{Alert, AlertSink};

/// Shows alerts through the desktop notification daemon.
pub struct DesktopSink {
    app_name: String,
}

impl DesktopSink {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl AlertSink for DesktopSink {
    fn show(&self, alert: &Alert) -> Result<()> {
        Notification::new()
            .appname(&self.app_name)
            .summary(&alert.title)
            .body(&alert.body)
            .show()
            .map(drop)
            .map_err(|err| Error::Notification(err.to_string()))
    }
}
