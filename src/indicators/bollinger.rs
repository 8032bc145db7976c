// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same trailing window.
//
// A zero-variance window collapses all three bands onto the window's value.
// =============================================================================

use serde::Serialize;

use super::error::{IndicatorError, Result};
use super::series::{align_tail, IndicatorSeries};
use super::sma::window_means;

/// One fully-defined band triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Column-wise Bollinger output, each column as long as the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerOutput {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

impl BollingerOutput {
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<BollingerPoint> {
        Some(BollingerPoint {
            upper: (*self.upper.get(i)?)?,
            middle: (*self.middle.get(i)?)?,
            lower: (*self.lower.get(i)?)?,
        })
    }
}

/// Compute Bollinger Bands over `period` with a `multiplier`·σ envelope.
///
/// A series shorter than `period` yields all-undefined columns.
///
/// # Errors
/// `InvalidParameter` when `period < 2` (σ is meaningless for one sample) or
/// `multiplier` is negative or non-finite.
pub fn compute_bollinger(prices: &[f64], period: usize, multiplier: f64) -> Result<BollingerOutput> {
    if period < 2 {
        return Err(IndicatorError::invalid_period(
            "bollinger.period",
            period,
            "period must be at least 2",
        ));
    }
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(IndicatorError::invalid(
            "bollinger.multiplier",
            multiplier,
            "multiplier must be a finite, non-negative number",
        ));
    }

    let middle = window_means(prices, period);
    let n = period as f64;

    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());
    for (window, &mean) in prices.windows(period).zip(&middle) {
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let band = multiplier * variance.sqrt();
        upper.push(mean + band);
        lower.push(mean - band);
    }

    let len = prices.len();
    Ok(BollingerOutput {
        upper: align_tail(len, &upper),
        middle: align_tail(len, &middle),
        lower: align_tail(len, &lower),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series::defined_prefix_len;

    #[test]
    fn bollinger_rejects_period_below_two() {
        assert!(compute_bollinger(&[1.0, 2.0, 3.0], 1, 2.0).is_err());
        assert!(compute_bollinger(&[1.0, 2.0, 3.0], 0, 2.0).is_err());
    }

    #[test]
    fn bollinger_rejects_negative_multiplier() {
        let err = compute_bollinger(&[1.0, 2.0, 3.0], 2, -0.5).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { name: "bollinger.multiplier", .. }));
        assert!(compute_bollinger(&[1.0, 2.0, 3.0], 2, f64::NAN).is_err());
    }

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = compute_bollinger(&closes, 20, 2.0).unwrap();
        assert_eq!(bb.len(), 20);
        assert_eq!(defined_prefix_len(&bb.middle), 19);
        let p = bb.point(19).unwrap();
        assert!((p.middle - 10.5).abs() < 1e-10);
        // population σ of 1..=20 = sqrt((20^2 - 1) / 12)
        let sigma = ((400.0_f64 - 1.0) / 12.0).sqrt();
        assert!((p.upper - (10.5 + 2.0 * sigma)).abs() < 1e-10);
        assert!((p.lower - (10.5 - 2.0 * sigma)).abs() < 1e-10);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = compute_bollinger(&[1.0, 2.0, 3.0], 20, 2.0).unwrap();
        assert_eq!(bb.len(), 3);
        assert!(bb.upper.iter().all(Option::is_none));
        assert!(bb.lower.iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_flat_window_collapses() {
        let bb = compute_bollinger(&vec![100.0; 20], 20, 2.0).unwrap();
        let p = bb.point(19).unwrap();
        assert_eq!(p.upper, 100.0);
        assert_eq!(p.middle, 100.0);
        assert_eq!(p.lower, 100.0);
    }

    #[test]
    fn bollinger_flat_non_dyadic_prices_collapse_exactly() {
        for price in [1823.17, 0.1] {
            let bb = compute_bollinger(&vec![price; 30], 20, 2.0).unwrap();
            for i in 19..30 {
                let p = bb.point(i).unwrap();
                assert_eq!(p.upper, price);
                assert_eq!(p.middle, price);
                assert_eq!(p.lower, price);
            }
        }
    }

    #[test]
    fn bollinger_bands_are_ordered() {
        let closes: Vec<f64> = (0..90)
            .map(|i| 1950.0 + 40.0 * (i as f64 / 5.0).cos() - (i % 7) as f64)
            .collect();
        for multiplier in [0.0, 1.0, 2.0, 3.5] {
            let bb = compute_bollinger(&closes, 20, multiplier).unwrap();
            for i in 0..bb.len() {
                if let Some(p) = bb.point(i) {
                    assert!(p.upper >= p.middle && p.middle >= p.lower);
                }
            }
        }
    }
}
