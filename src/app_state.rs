// =============================================================================
// Central Application State — Gold Pulse
// =============================================================================
//
// Ties the settings store, the price feed, the recompute gate and the live
// quote together for the REST API and the background refresh task.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for the settings store and small mutable snapshots.
//   - Locks are never held across an `.await`; computations receive copies.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::indicators::{IndicatorConfig, IndicatorError};
use crate::live_price::LiveQuote;
use crate::overlay::{build_overlay, Overlay};
use crate::price_feed::PriceFeed;
use crate::recompute::{Committed, RecomputeGate, Superseded};
use crate::runtime_config::{DashboardConfig, Preferences};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// Optional machine-readable error code.
    pub code: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Why a recompute request produced no committed overlay.
#[derive(Debug, Error)]
pub enum RecomputeError {
    #[error(transparent)]
    InvalidParameter(#[from] IndicatorError),

    #[error("price fetch failed: {0:#}")]
    Fetch(anyhow::Error),

    #[error(transparent)]
    Superseded(#[from] Superseded),
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, bumped on every meaningful
    /// state mutation.
    pub state_version: AtomicU64,

    // ── Settings store ──────────────────────────────────────────────────
    pub config: RwLock<DashboardConfig>,
    /// Bearer token required by mutating endpoints. `None` disables them.
    pub admin_token: Option<String>,

    // ── Data ────────────────────────────────────────────────────────────
    pub feed: PriceFeed,
    pub overlays: RecomputeGate<Overlay>,
    pub live_quote: RwLock<Option<LiveQuote>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    refresh: Notify,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given configuration.
    pub fn new(config: DashboardConfig, admin_token: Option<String>) -> Result<Self> {
        let feed = PriceFeed::new(config.feed.clone())?;
        Ok(Self {
            state_version: AtomicU64::new(1),
            config: RwLock::new(config),
            admin_token: admin_token.filter(|t| !t.is_empty()),
            feed,
            overlays: RecomputeGate::new(),
            live_quote: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            refresh: Notify::new(),
            start_time: std::time::Instant::now(),
        })
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    // ── Settings snapshots ──────────────────────────────────────────────

    pub fn preferences(&self) -> Preferences {
        self.config.read().preferences.clone()
    }

    /// Copy of the stored indicator config, taken under a short read lock.
    pub fn indicator_config(&self) -> IndicatorConfig {
        self.config.read().indicators
    }

    // ── Live price wake-up ──────────────────────────────────────────────

    /// Ask the refresh loop to fetch a new quote now. A request made while
    /// the loop is busy is kept and served on its next wait.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    pub fn refresh_requested(&self) -> Notified<'_> {
        self.refresh.notified()
    }

    // ── Recompute ───────────────────────────────────────────────────────

    /// Fetch `period_days` of history and compute overlays with `config`.
    ///
    /// The request takes a token up front; if a newer request starts before
    /// this one finishes, the result is discarded with `Superseded`.
    pub async fn recompute(
        &self,
        period_days: u32,
        config: IndicatorConfig,
    ) -> Result<Committed<Overlay>, RecomputeError> {
        config.validate()?;
        let token = self.overlays.begin();
        info!(%token, period_days, "recompute started");

        let series = match self.feed.history(period_days).await {
            Ok(series) => series,
            Err(e) => {
                warn!(%token, error = %e, "historical data fetch failed");
                self.push_error(format!("historical data fetch failed: {e:#}"));
                return Err(RecomputeError::Fetch(e));
            }
        };

        if !self.overlays.is_current(token) {
            let stale = Superseded {
                token,
                latest: self.overlays.newest(),
            };
            info!(%token, latest = %stale.latest, "stale fetch discarded");
            return Err(stale.into());
        }

        let overlay = build_overlay(&series, config)?;
        let committed = self.overlays.commit(token, overlay).inspect_err(|stale| {
            info!(%token, latest = %stale.latest, "stale overlay discarded");
        })?;

        info!(%token, points = series.len(), "overlay committed");
        self.increment_version();
        Ok(committed)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, msg: String) {
        self.push_error_with_code(msg, None);
    }

    /// Record an error with an optional machine-readable code.
    pub fn push_error_with_code(&self, msg: String, code: Option<String>) {
        let record = ErrorRecord {
            message: msg,
            code,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }
}
