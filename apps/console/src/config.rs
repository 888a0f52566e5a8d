use std::{collections::HashMap, fs, path::Path, time::Duration};

use console_core::{FormSettings, RejectionHandling};
use tracing::warn;

pub const CONFIG_FILE: &str = "console.toml";
const DEFAULT_BASE_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_api_url: String,
    pub token: String,
    pub refresh_delay_ms: u64,
    pub rejection_handling: RejectionHandling,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_api_url: DEFAULT_BASE_API_URL.into(),
            token: String::new(),
            refresh_delay_ms: 1000,
            rejection_handling: RejectionHandling::Legacy,
        }
    }
}

impl Settings {
    pub fn form_settings(&self) -> FormSettings {
        let mut settings = FormSettings::new(self.base_api_url.clone(), self.token.clone());
        settings.refresh_delay = Duration::from_millis(self.refresh_delay_ms);
        settings.rejection_handling = self.rejection_handling;
        settings
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `console.toml` map, then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply(&mut settings, |key| file_cfg.get(key).cloned()),
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring unreadable config file"),
        }
    }

    apply(&mut settings, |key| match key {
        "base_api_url" => env("APP__BASE_API_URL").or_else(|| env("BASE_API_URL")),
        "token" => env("APP__TOKEN").or_else(|| env("CONSOLE_TOKEN")),
        "refresh_delay_ms" => env("APP__REFRESH_DELAY_MS"),
        "rejection_handling" => env("APP__REJECTION_HANDLING"),
        _ => None,
    });

    settings
}

fn apply(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("base_api_url") {
        settings.base_api_url = normalize_base_url(&v);
    }
    if let Some(v) = lookup("token") {
        settings.token = v.trim().to_string();
    }
    if let Some(v) = lookup("refresh_delay_ms") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.refresh_delay_ms = parsed;
        }
    }
    if let Some(v) = lookup("rejection_handling") {
        if let Ok(parsed) = v.parse::<RejectionHandling>() {
            settings.rejection_handling = parsed;
        }
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Settings::default().base_api_url;
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
