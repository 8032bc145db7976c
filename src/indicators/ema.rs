// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` closes
// and sits at index `period - 1`.
// =============================================================================

use super::error::{require_period, Result};
use super::series::{align_tail, IndicatorSeries};

/// Compute the EMA column for `prices`.
///
/// A series shorter than `period` produces an all-undefined column.
///
/// # Errors
/// `InvalidParameter` when `period == 0`.
pub fn compute_ema(prices: &[f64], period: usize) -> Result<IndicatorSeries> {
    require_period("ema.period", period)?;
    Ok(align_tail(prices.len(), &ema_tail(prices, period)))
}

/// Raw EMA values starting at index `period - 1` of `values`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Otherwise the tail always has `values.len() - period + 1` entries. Once a
/// non-finite value enters the recurrence every later entry is NaN, which the
/// alignment step turns into `None` in place.
pub(crate) fn ema_tail(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(if seed.is_finite() { seed } else { f64::NAN });

    let mut prev = seed;
    for &value in &values[period..] {
        let ema = if prev.is_finite() {
            value * multiplier + prev * (1.0 - multiplier)
        } else {
            f64::NAN
        };
        let ema = if ema.is_finite() { ema } else { f64::NAN };
        result.push(ema);
        prev = ema;
    }

    result
}
