// =============================================================================
// Price Feed — upstream history, spot quote and FX rates over HTTP
// =============================================================================
//
// Thin adapter over the upstream price services. There is no retry: a failed
// fetch is reported to the caller, logged, and the next trigger tries again.
//
// When no history endpoint is configured the feed serves a deterministic demo
// series so the dashboard runs offline. The demo series also stands in for the
// spot quote when no live endpoint is configured.
// =============================================================================

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::runtime_config::FeedConfig;
use crate::types::{PricePoint, PriceSeries};

/// Number of daily points in the demo series (covers the 1-year window).
const DEMO_DAYS: usize = 400;

#[derive(Debug, Deserialize)]
struct SpotResponse {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    rates: std::collections::HashMap<String, f64>,
}

/// Upstream client. Cheap to share behind an `Arc`.
pub struct PriceFeed {
    client: reqwest::Client,
    config: FeedConfig,
    demo: PriceSeries,
}

impl PriceFeed {
    /// Build the feed with a `timeout_secs` request timeout.
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        debug!(
            history_url = ?config.history_url,
            live_url = ?config.live_url,
            "PriceFeed initialised"
        );

        Ok(Self {
            client,
            config,
            demo: demo_series(),
        })
    }

    /// `true` when history comes from the built-in demo series.
    pub fn is_demo(&self) -> bool {
        self.config.history_url.is_none()
    }

    /// Fetch the last `period_days` of daily prices.
    #[instrument(skip(self), name = "price_feed::history")]
    pub async fn history(&self, period_days: u32) -> Result<PriceSeries> {
        let Some(url) = &self.config.history_url else {
            return Ok(self.demo.last_days(period_days));
        };

        let resp = self
            .client
            .get(url)
            .query(&[("period", period_days)])
            .send()
            .await
            .context("GET historical data request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("historical data request returned HTTP {status}");
        }

        let series: PriceSeries = resp
            .json()
            .await
            .context("failed to parse historical data")?;

        debug!(points = series.len(), "historical data fetched");
        Ok(series.last_days(period_days))
    }

    /// Current spot price in USD per troy ounce.
    #[instrument(skip(self), name = "price_feed::spot_usd")]
    pub async fn spot_usd(&self) -> Result<f64> {
        let Some(url) = &self.config.live_url else {
            return self
                .demo
                .last()
                .map(|p| p.price)
                .ok_or_else(|| anyhow!("demo series is empty"));
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET live price request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("live price request returned HTTP {status}");
        }

        let body: SpotResponse = resp.json().await.context("failed to parse live price")?;
        validate_price(body.price)
    }

    /// Units of `currency` per 1 USD.
    #[instrument(skip(self), name = "price_feed::usd_rate")]
    pub async fn usd_rate(&self, currency: &str) -> Result<f64> {
        if currency == "USD" {
            return Ok(1.0);
        }
        let Some(url) = &self.config.fx_url else {
            bail!("no exchange-rate endpoint configured");
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET exchange rate request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("exchange rate request returned HTTP {status}");
        }

        let body: FxResponse = resp.json().await.context("failed to parse exchange rates")?;
        let rate = body
            .rates
            .get(currency)
            .copied()
            .ok_or_else(|| anyhow!("{currency} exchange rate unavailable"))?;
        validate_price(rate).with_context(|| format!("bad {currency} exchange rate"))
    }
}

fn validate_price(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(anyhow!("invalid price format: {value}"))
    }
}

/// Deterministic daily series starting 2024-12-01 at 1820 USD/oz.
fn demo_series() -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default();
    let points = (0..DEMO_DAYS)
        .map(|i| {
            let t = i as f64;
            PricePoint {
                date: start + chrono::Duration::days(i as i64),
                price: 1820.0 + 0.9 * t + 18.0 * (t / 5.0).sin() + 7.0 * (t / 1.7).sin(),
            }
        })
        .collect();
    // The generator only yields ascending dates and prices above 1000.
    PriceSeries::new(points).unwrap_or_default()
}
