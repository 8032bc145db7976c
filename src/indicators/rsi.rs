// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether gold is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero-division policy (fixed, not left to float semantics):
//   avg_loss == 0, avg_gain > 0  => 100
//   avg_loss == 0, avg_gain == 0 => 50   (flat market, no bias)
// =============================================================================

use super::error::{require_period, Result};
use super::series::{align_tail, IndicatorSeries};

/// RSI of a window with no movement at all.
pub const FLAT_MARKET_RSI: f64 = 50.0;

/// Compute the RSI column for `prices`.
///
/// The first `period` entries are undefined: the first value needs `period`
/// deltas, i.e. `period + 1` prices. A series of `period` prices or fewer
/// yields an all-undefined column.
///
/// # Errors
/// `InvalidParameter` when `period == 0`.
pub fn compute_rsi(prices: &[f64], period: usize) -> Result<IndicatorSeries> {
    require_period("rsi.period", period)?;
    Ok(align_tail(prices.len(), &rsi_tail(prices, period)))
}

fn rsi_tail(closes: &[f64], period: usize) -> Vec<f64> {
    if closes.len() <= period {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| (g + gain(d), l + loss(d)));

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    result.push(rsi_from_averages(avg_gain, avg_loss));

    for &delta in &deltas[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + gain(delta)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss(delta)) / period_f;
        result.push(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

fn gain(delta: f64) -> f64 {
    if delta > 0.0 {
        delta
    } else {
        0.0
    }
}

fn loss(delta: f64) -> f64 {
    if delta < 0.0 {
        -delta
    } else {
        0.0
    }
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Non-finite averages (a NaN price upstream) give NaN, which the alignment
/// step turns into an undefined entry.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        FLAT_MARKET_RSI
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}
