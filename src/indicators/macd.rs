// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd[i]      = EMA_fast[i] - EMA_slow[i]
//   signal       = EMA(macd, signal_period), run over the defined suffix only
//   histogram[i] = macd[i] - signal[i]
//
// All three columns share one warm-up: index `slow + signal - 2` is the first
// where the signal line exists, so a MACD point is either fully defined or
// fully undefined. The chart never has to plot a MACD line whose histogram is
// missing.
// =============================================================================

use serde::Serialize;

use super::ema::ema_tail;
use super::error::{require_period, IndicatorError, Result};
use super::series::{align_tail, all_undefined, IndicatorSeries};

/// One fully-defined MACD time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Column-wise MACD output, each column as long as the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

impl MacdOutput {
    fn undefined(len: usize) -> Self {
        Self {
            macd: all_undefined(len),
            signal: all_undefined(len),
            histogram: all_undefined(len),
        }
    }

    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// Row view at index `i`; `None` inside the warm-up or out of range.
    pub fn point(&self, i: usize) -> Option<MacdPoint> {
        Some(MacdPoint {
            macd: (*self.macd.get(i)?)?,
            signal: (*self.signal.get(i)?)?,
            histogram: (*self.histogram.get(i)?)?,
        })
    }
}

/// Compute MACD with the given fast / slow / signal periods.
///
/// # Errors
/// `InvalidParameter` when any period is zero or `fast >= slow`.
pub fn compute_macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Result<MacdOutput> {
    require_period("macd.fast_period", fast)?;
    require_period("macd.slow_period", slow)?;
    require_period("macd.signal_period", signal)?;
    if fast >= slow {
        return Err(IndicatorError::invalid_period(
            "macd.fast_period",
            fast,
            "fast period must be shorter than slow period",
        ));
    }

    let len = prices.len();
    let fast_ema = ema_tail(prices, fast);
    let slow_ema = ema_tail(prices, slow);
    if slow_ema.is_empty() {
        return Ok(MacdOutput::undefined(len));
    }

    // Both tails end at the last price; the fast one simply starts earlier.
    let skip = fast_ema.len().saturating_sub(slow_ema.len());
    let macd_line: Vec<f64> = fast_ema[skip..]
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_tail(&macd_line, signal);
    if signal_line.is_empty() {
        return Ok(MacdOutput::undefined(len));
    }

    let macd_line = &macd_line[macd_line.len() - signal_line.len()..];
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    Ok(MacdOutput {
        macd: align_tail(len, macd_line),
        signal: align_tail(len, &signal_line),
        histogram: align_tail(len, &histogram),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series::defined_prefix_len;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1900.0 + 25.0 * (i as f64 / 4.0).sin() + i as f64 * 0.8)
            .collect()
    }

    #[test]
    fn macd_inverted_periods_rejected() {
        let err = compute_macd(&wave(60), 26, 12, 9).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { name: "macd.fast_period", .. }));
    }

    #[test]
    fn macd_nan_price_does_not_shift_columns() {
        let mut prices = wave(60);
        prices[50] = f64::NAN;
        let out = compute_macd(&prices, 12, 26, 9).unwrap();
        assert_eq!(out.len(), 60);
        assert_eq!(defined_prefix_len(&out.signal), 33);
        assert!((33..50).all(|i| out.point(i).is_some()));
        assert!((50..60).all(|i| out.macd[i].is_none() && out.histogram[i].is_none()));
    }

    #[test]
    fn macd_equal_periods_rejected() {
        assert!(compute_macd(&wave(60), 12, 12, 9).is_err());
    }

    #[test]
    fn macd_zero_signal_rejected() {
        assert!(compute_macd(&wave(60), 12, 26, 0).is_err());
    }

    #[test]
    fn macd_warm_up_is_slow_plus_signal_minus_two() {
        let prices = wave(80);
        let out = compute_macd(&prices, 12, 26, 9).unwrap();
        assert_eq!(out.len(), prices.len());
        assert_eq!(defined_prefix_len(&out.macd), 33);
        assert_eq!(defined_prefix_len(&out.signal), 33);
        assert_eq!(defined_prefix_len(&out.histogram), 33);
        assert!(out.point(32).is_none());
        assert!(out.point(33).is_some());
    }

    #[test]
    fn macd_histogram_is_macd_minus_signal() {
        let out = compute_macd(&wave(120), 12, 26, 9).unwrap();
        for i in 0..out.len() {
            if let Some(p) = out.point(i) {
                assert!((p.histogram - (p.macd - p.signal)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_line_matches_ema_difference() {
        let prices = wave(60);
        let out = compute_macd(&prices, 3, 6, 2).unwrap();
        let fast = crate::indicators::compute_ema(&prices, 3).unwrap();
        let slow = crate::indicators::compute_ema(&prices, 6).unwrap();
        for i in 6..prices.len() {
            let expected = fast[i].unwrap() - slow[i].unwrap();
            assert!((out.macd[i].unwrap() - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn macd_short_series_is_all_undefined() {
        // 33 points: slow EMA exists but the signal line never does.
        let out = compute_macd(&wave(33), 12, 26, 9).unwrap();
        assert_eq!(out.len(), 33);
        assert!(out.macd.iter().all(Option::is_none));
        assert!(out.histogram.iter().all(Option::is_none));

        let empty = compute_macd(&[], 12, 26, 9).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn macd_constant_series_is_zero() {
        let out = compute_macd(&vec![2000.0; 50], 12, 26, 9).unwrap();
        let p = out.point(49).unwrap();
        assert!(p.macd.abs() < 1e-9);
        assert!(p.histogram.abs() < 1e-9);
    }
}
