// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_i = (p_{i-period+1} + ... + p_i) / period      for i >= period - 1
//
// Each window is summed independently, with no running-sum drift. A window
// whose values are all equal yields that value exactly, since the summed mean
// of a non-dyadic price such as 1823.17 does not round-trip.
// =============================================================================

use super::error::{require_period, IndicatorError, Result};
use super::series::{align_tail, IndicatorSeries};

/// Compute the SMA column for `prices`.
///
/// # Errors
/// `InvalidParameter` when `period == 0` or `period > prices.len()`.
pub fn compute_sma(prices: &[f64], period: usize) -> Result<IndicatorSeries> {
    require_period("sma.period", period)?;
    if period > prices.len() {
        return Err(IndicatorError::invalid_period(
            "sma.period",
            period,
            "period exceeds series length",
        ));
    }
    Ok(align_tail(prices.len(), &window_means(prices, period)))
}

/// Mean of every full trailing window. The first element belongs to index
/// `period - 1`. Empty when the series is shorter than `period`.
pub(crate) fn window_means(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let n = period as f64;
    prices
        .windows(period)
        .map(|w| {
            let first = w[0];
            if w.iter().all(|&x| x == first) {
                first
            } else {
                w.iter().sum::<f64>() / n
            }
        })
        .collect()
}
