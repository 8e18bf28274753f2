use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Weekday;
use serde::Deserialize;
use tracing::{error, info};

const CONFIG_ENV_VAR: &str = "FORTNIGHT_CONFIG";
const CONFIG_FILE: &str = "fortnight.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Per-view display settings. Each view owns a copy; the task data they
/// project is shared elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ViewSettings {
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default = "default_highlight_weekends")]
    pub highlight_weekends: bool,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            highlight_weekends: default_highlight_weekends(),
            theme: Theme::default(),
        }
    }
}

fn default_highlight_weekends() -> bool {
    true
}

impl ViewSettings {
    /// Load settings from a TOML file.
    ///
    /// An explicit `override_path` must exist and parse. A discovered path
    /// (env var or `fortnight.toml` in the working directory) falls back to
    /// defaults on any failure, so a broken config never blocks the planner.
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = override_path {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let settings: ViewSettings = toml::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(config = %path.display(), "loaded view settings");
            return Ok(settings);
        }

        let Some(path) = discover_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        match fs::read_to_string(&path)
            .map_err(anyhow::Error::new)
            .and_then(|text| toml::from_str::<ViewSettings>(&text).map_err(anyhow::Error::new))
        {
            Ok(settings) => {
                info!(config = %path.display(), "loaded view settings");
                Ok(settings)
            }
            Err(err) => {
                error!(config = %path.display(), error = %err, "failed parsing view settings; using defaults");
                Ok(Self::default())
            }
        }
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir().ok().map(|dir| dir.join(CONFIG_FILE))
}
