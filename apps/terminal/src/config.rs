use std::{fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub feedback_hide_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            feedback_hide_ms: 5000,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn feedback_hide_after(&self) -> Duration {
        Duration::from_millis(self.feedback_hide_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Defaults, then the optional toml file, then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    apply_env(&mut settings, lookup);
    Ok(settings)
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ROSTER_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__FEEDBACK_HIDE_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.feedback_hide_ms = parsed;
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}
