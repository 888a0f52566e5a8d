//! Dialog controllers: draft state, client side validation and the mapping
//! from bridge envelopes to notifications.

use std::{fmt, str::FromStr, time::Duration};

use shared::{domain::MenuId, error::ParseEnumError};
use thiserror::Error;

use crate::bridge::join_url;

pub mod menu;
pub mod search;

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(MenuId),
}

/// What a dialog does when the API answers with `status: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionHandling {
    /// Close the dialog and show the server message with success styling,
    /// then refresh. This is how the console has always behaved.
    #[default]
    Legacy,
    /// Keep the dialog open and show a warning. No refresh.
    Strict,
}

impl fmt::Display for RejectionHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for RejectionHandling {
    type Err = ParseEnumError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "strict" => Ok(Self::Strict),
            _ => Err(ParseEnumError::new("rejection handling", raw)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormSettings {
    pub base_url: String,
    pub token: String,
    pub refresh_delay: Duration,
    pub rejection_handling: RejectionHandling,
}

impl FormSettings {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            refresh_delay: DEFAULT_REFRESH_DELAY,
            rejection_handling: RejectionHandling::default(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Failures that escape the normal validation and envelope paths.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("dialog is not open (state: {0:?})")]
    NotOpen(DialogState),
    #[error("refresh task failed: {0}")]
    Refresh(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_handling_parses_known_names() {
        assert_eq!(
            "Strict".parse::<RejectionHandling>().expect("parse"),
            RejectionHandling::Strict
        );
        assert_eq!(
            " legacy ".parse::<RejectionHandling>().expect("parse"),
            RejectionHandling::Legacy
        );
        assert!("lenient".parse::<RejectionHandling>().is_err());
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let settings = FormSettings::new("http://api.local/", "");
        assert_eq!(settings.endpoint("/menu/"), "http://api.local/menu/");
        assert_eq!(settings.endpoint("menu/7"), "http://api.local/menu/7");
    }
}
