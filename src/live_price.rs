// =============================================================================
// Live Price — spot quote refresh with currency conversion
// =============================================================================
//
// The spot quote is fetched in USD/oz and converted to the preferred currency.
// If the conversion fails the USD quote is kept and a warning is logged; the
// dashboard still shows a price.
//
// The refresh loop sleeps `refresh_rate_minutes` between ticks, re-reading the
// rate every tick, so a settings change takes effect on the next cycle. A
// currency change wakes the loop immediately through `AppState::refresh_now`.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::price_feed::PriceFeed;

/// Most recent spot quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveQuote {
    pub price_usd: f64,
    /// Price in `currency`; equals `price_usd` when the currency is USD or the
    /// conversion failed.
    pub price: f64,
    pub currency: String,
    pub fetched_at: DateTime<Utc>,
}

impl LiveQuote {
    fn usd(price_usd: f64) -> Self {
        Self {
            price_usd,
            price: price_usd,
            currency: "USD".to_string(),
            fetched_at: Utc::now(),
        }
    }
}

/// Fetch the spot price and convert it to `currency`.
///
/// # Errors
/// Only when the spot price itself cannot be fetched.
pub async fn fetch_quote(feed: &PriceFeed, currency: &str) -> Result<LiveQuote> {
    let price_usd = feed.spot_usd().await?;
    info!(price_usd = %format!("{price_usd:.2}"), "fetched gold price (USD/oz)");

    if currency == "USD" {
        return Ok(LiveQuote::usd(price_usd));
    }

    match feed.usd_rate(currency).await {
        Ok(rate) => {
            let price = price_usd * rate;
            info!(%currency, rate, price = %format!("{price:.2}"), "converted gold price");
            Ok(LiveQuote {
                price_usd,
                price,
                currency: currency.to_string(),
                fetched_at: Utc::now(),
            })
        }
        Err(e) => {
            warn!(%currency, error = %e, "unable to convert gold price, showing USD");
            Ok(LiveQuote::usd(price_usd))
        }
    }
}

/// Fetch once and store the result (or the error) in `state`.
pub async fn refresh_once(state: &AppState) {
    let currency = state.preferences().currency;
    match fetch_quote(&state.feed, &currency).await {
        Ok(quote) => {
            *state.live_quote.write() = Some(quote);
            state.increment_version();
        }
        Err(e) => {
            warn!(error = %e, "live price refresh failed");
            state.push_error(format!("live price refresh failed: {e:#}"));
        }
    }
}

/// Refresh forever. Intended to run on its own task.
pub async fn run_refresh_loop(state: Arc<AppState>) {
    loop {
        refresh_once(&state).await;

        let minutes = state.preferences().refresh_rate_minutes;
        info!(minutes, "next live price refresh scheduled");

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)) => {
                info!("auto-refresh triggered");
            }
            _ = state.refresh_requested() => {
                info!("live price refresh requested");
            }
        }
    }
}
