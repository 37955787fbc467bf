use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::annotator::dialog::DialogSize;
use crate::i18n::{parse_language_tag, Locale};
use crate::notification::NotificationTimings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dialog: DialogSize,
    /// Gap between the target element and the comment dialog.
    pub dialog_spacing: f64,
    /// Horizontal distance from an element's right edge to its marker.
    pub marker_offset: f64,
    /// Longest text used in an element identifier, ellipsis included.
    pub label_text_limit: usize,
    pub notification_enter_ms: i64,
    pub notification_visible_ms: i64,
    pub notification_fade_ms: i64,
    pub include_errors_default: bool,
    /// Fixed UI language. Unset means follow the page's language tag.
    pub locale: Option<Locale>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialog: DialogSize::default(),
            dialog_spacing: 15.0,
            marker_offset: 5.0,
            label_text_limit: 50,
            notification_enter_ms: 10,
            notification_visible_ms: 2000,
            notification_fade_ms: 300,
            include_errors_default: true,
            locale: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the config at `path`. A missing or unreadable file gives the
    /// defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config not readable, using defaults");
                return Self::default();
            }
        };
        Self::from_json(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "config invalid, using defaults");
            Self::default()
        })
    }

    /// The configured locale, else the one `host_language` names, else
    /// English.
    pub fn resolve_locale(&self, host_language: Option<&str>) -> Locale {
        self.locale
            .or_else(|| host_language.and_then(parse_language_tag))
            .unwrap_or_default()
    }

    pub fn notification_timings(&self) -> NotificationTimings {
        NotificationTimings {
            enter_ms: self.notification_enter_ms,
            visible_ms: self.notification_visible_ms,
            fade_ms: self.notification_fade_ms,
        }
    }
}
