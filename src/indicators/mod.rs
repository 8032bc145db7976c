// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn on the gold
// chart. Every function takes a price slice plus explicit parameters and
// returns columns exactly as long as the input, with the warm-up head marked
// `None`. No function reads ambient configuration or keeps state between
// calls.

pub mod bollinger;
pub mod config;
pub mod ema;
pub mod error;
pub mod macd;
pub mod rsi;
pub mod series;
pub mod sma;

pub use bollinger::{compute_bollinger, BollingerOutput, BollingerPoint};
pub use config::{
    BollingerConfig, IndicatorConfig, MacdConfig, RsiConfig, SmaConfig, MAX_LOOKBACK,
};
pub use ema::compute_ema;
pub use error::{IndicatorError, Result};
pub use macd::{compute_macd, MacdOutput, MacdPoint};
pub use rsi::compute_rsi;
pub use series::{align_tail, all_undefined, defined_prefix_len, last_defined, IndicatorSeries};
pub use sma::compute_sma;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 2000.0 + 30.0 * (i as f64 / 6.0).sin() + ((i * 11) % 5) as f64)
            .collect()
    }

    #[test]
    fn every_indicator_preserves_length() {
        for n in [0usize, 1, 5, 19, 20, 34, 35, 100] {
            let prices = sample(n);
            assert_eq!(compute_rsi(&prices, 14).unwrap().len(), n);
            assert_eq!(compute_ema(&prices, 10).unwrap().len(), n);
            assert_eq!(compute_macd(&prices, 12, 26, 9).unwrap().len(), n);
            assert_eq!(compute_bollinger(&prices, 20, 2.0).unwrap().len(), n);
            if n >= 10 {
                assert_eq!(compute_sma(&prices, 10).unwrap().len(), n);
            }
        }
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let prices = sample(90);
        let bits = |s: &[Option<f64>]| s.iter().map(|v| v.map(f64::to_bits)).collect::<Vec<_>>();

        let a = compute_macd(&prices, 12, 26, 9).unwrap();
        let b = compute_macd(&prices, 12, 26, 9).unwrap();
        assert_eq!(bits(&a.histogram), bits(&b.histogram));

        let a = compute_bollinger(&prices, 20, 2.0).unwrap();
        let b = compute_bollinger(&prices, 20, 2.0).unwrap();
        assert_eq!(bits(&a.upper), bits(&b.upper));

        assert_eq!(
            bits(&compute_sma(&prices, 30).unwrap()),
            bits(&compute_sma(&prices, 30).unwrap())
        );
    }

    #[test]
    fn warm_ups_line_up_on_shared_axis() {
        let prices = sample(60);
        assert_eq!(defined_prefix_len(&compute_sma(&prices, 30).unwrap()), 29);
        assert_eq!(defined_prefix_len(&compute_ema(&prices, 12).unwrap()), 11);
        assert_eq!(defined_prefix_len(&compute_rsi(&prices, 14).unwrap()), 14);
        assert_eq!(defined_prefix_len(&compute_bollinger(&prices, 20, 2.0).unwrap().middle), 19);
        assert_eq!(defined_prefix_len(&compute_macd(&prices, 12, 26, 9).unwrap().signal), 33);
    }
}
