// =============================================================================
// Runtime Configuration — startup file, env overrides, validated preferences
// =============================================================================
//
// Every tunable lives here: user preferences, indicator parameters and the
// upstream price-feed endpoints. The file is read once at startup; edits made
// through the API live in memory only.
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::IndicatorConfig;
use crate::types::Theme;

/// Inclusive bounds for the live-price refresh cadence, in minutes.
pub const REFRESH_RATE_RANGE: std::ops::RangeInclusive<u32> = 1..=60;
/// Inclusive bounds for the chart window, in days.
pub const PERIOD_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=3650;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_currency() -> String {
    "USD".to_string()
}

fn default_refresh_rate_minutes() -> u32 {
    5
}

fn default_period_days() -> u32 {
    30
}

fn default_fx_url() -> Option<String> {
    Some("https://api.exchangerate-api.com/v4/latest/USD".to_string())
}

fn default_timeout_secs() -> u64 {
    10
}

// =============================================================================
// Preferences
// =============================================================================

/// User-facing dashboard preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,

    /// ISO 4217 code the live quote is shown in.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Minutes between live-price refreshes.
    #[serde(default = "default_refresh_rate_minutes")]
    pub refresh_rate_minutes: u32,

    /// Chart window used when a request does not name one.
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            currency: default_currency(),
            refresh_rate_minutes: default_refresh_rate_minutes(),
            default_period_days: default_period_days(),
        }
    }
}

impl Preferences {
    /// Return every problem found; an empty list means the preferences are
    /// usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_currency_code(&self.currency) {
            problems.push(format!(
                "currency must be a 3-letter code, got {:?}",
                self.currency
            ));
        }
        if !REFRESH_RATE_RANGE.contains(&self.refresh_rate_minutes) {
            problems.push(format!(
                "refresh_rate_minutes must be between 1 and 60, got {}",
                self.refresh_rate_minutes
            ));
        }
        if !PERIOD_DAYS_RANGE.contains(&self.default_period_days) {
            problems.push(format!(
                "default_period_days must be between 1 and 3650, got {}",
                self.default_period_days
            ));
        }
        problems
    }
}

/// Upper-cased 3-letter ASCII code check.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

// =============================================================================
// FeedConfig
// =============================================================================

/// Where the price data comes from. A missing `history_url` selects the
/// built-in demo series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// `GET {history_url}?period=<days>` → `[{date, price}]`.
    #[serde(default)]
    pub history_url: Option<String>,

    /// `GET {live_url}` → `{ "price": <USD/oz> }`.
    #[serde(default)]
    pub live_url: Option<String>,

    /// `GET {fx_url}` → `{ "rates": { "MYR": 4.47, ... } }`, USD based.
    #[serde(default = "default_fx_url")]
    pub fx_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            history_url: None,
            live_url: None,
            fx_url: default_fx_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// DashboardConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub preferences: Preferences,

    #[serde(default)]
    pub indicators: IndicatorConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        info!(
            path = %path.display(),
            currency = %config.preferences.currency,
            refresh_rate_minutes = config.preferences.refresh_rate_minutes,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Override feed endpoints from `GOLD_HISTORY_URL`, `GOLD_LIVE_URL` and
    /// `GOLD_FX_URL` when they are set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty("GOLD_HISTORY_URL") {
            self.feed.history_url = Some(url);
        }
        if let Some(url) = non_empty("GOLD_LIVE_URL") {
            self.feed.live_url = Some(url);
        }
        if let Some(url) = non_empty("GOLD_FX_URL") {
            self.feed.fx_url = Some(url);
        }
    }

    /// Reset any section that fails validation to its defaults, logging what
    /// was wrong. Returns `true` if anything was reset.
    pub fn sanitize(&mut self) -> bool {
        let mut reset = false;

        let problems = self.preferences.problems();
        if !problems.is_empty() {
            warn!(?problems, "invalid preferences, resetting to defaults");
            self.preferences = Preferences::default();
            reset = true;
        }

        if let Err(e) = self.indicators.validate() {
            warn!(error = %e, "invalid indicator config, resetting to defaults");
            self.indicators = IndicatorConfig::default();
            reset = true;
        }

        reset
    }
}
