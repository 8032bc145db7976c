// =============================================================================
// Chart Overlay Builder
// =============================================================================
//
// Runs every enabled indicator against one price series with one config
// snapshot and packages the result for the chart: a date axis, the raw price
// column, and one column per overlay, all of identical length.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::{
    all_undefined, compute_bollinger, compute_macd, compute_rsi, compute_sma, last_defined,
    BollingerOutput, IndicatorConfig, IndicatorSeries, MacdOutput, Result,
};
use crate::types::PriceSeries;

/// RSI thresholds used for the headline reading.
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi >= RSI_OVERBOUGHT {
            Self::Overbought
        } else if rsi <= RSI_OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

/// Most recent defined value of each enabled overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestReadings {
    pub price: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub sma: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

/// Everything the chart needs for one render, index-aligned on `labels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub labels: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerOutput>,
    pub latest: LatestReadings,
    /// The exact parameters this overlay was computed with.
    pub config: IndicatorConfig,
}

/// Compute every enabled overlay for `series`.
///
/// # Errors
/// `InvalidParameter` from the first indicator whose parameters are malformed.
/// A series that is merely too short yields undefined columns instead.
pub fn build_overlay(series: &PriceSeries, config: IndicatorConfig) -> Result<Overlay> {
    config.validate()?;

    let prices = series.prices();
    let len = prices.len();

    let rsi = config
        .rsi
        .enabled
        .then(|| compute_rsi(&prices, config.rsi.period))
        .transpose()?;

    // compute_sma treats period > len as a caller error; here a short window
    // is an ordinary state and just has no SMA yet.
    let sma = config
        .sma
        .enabled
        .then(|| {
            if config.sma.period > len {
                Ok(all_undefined(len))
            } else {
                compute_sma(&prices, config.sma.period)
            }
        })
        .transpose()?;

    let macd = config
        .macd
        .enabled
        .then(|| {
            compute_macd(
                &prices,
                config.macd.fast_period,
                config.macd.slow_period,
                config.macd.signal_period,
            )
        })
        .transpose()?;

    let bollinger = config
        .bollinger
        .enabled
        .then(|| compute_bollinger(&prices, config.bollinger.period, config.bollinger.multiplier))
        .transpose()?;

    let latest_rsi = rsi.as_deref().and_then(last_defined);
    let latest = LatestReadings {
        price: prices.last().copied(),
        rsi: latest_rsi,
        rsi_zone: latest_rsi.map(RsiZone::classify),
        sma: sma.as_deref().and_then(last_defined),
        macd_histogram: macd.as_ref().and_then(|m| last_defined(&m.histogram)),
        bollinger_upper: bollinger.as_ref().and_then(|b| last_defined(&b.upper)),
        bollinger_lower: bollinger.as_ref().and_then(|b| last_defined(&b.lower)),
    };

    Ok(Overlay {
        labels: series.dates(),
        prices,
        rsi,
        sma,
        macd,
        bollinger,
        latest,
        config,
    })
}
