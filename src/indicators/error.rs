// =============================================================================
// Indicator Errors
// =============================================================================
//
// Only malformed parameters are errors. A series that is too short for the
// requested lookback is a normal transient state (e.g. right after switching
// to a shorter chart window) and yields an all-undefined output instead.

use thiserror::Error;

/// Error returned by the indicator engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// A period, multiplier or period combination the engine cannot honour.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the indicator config.
        name: &'static str,
        /// Offending value (periods are widened to `f64`).
        value: f64,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

impl IndicatorError {
    pub(crate) fn invalid(name: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
            reason,
        }
    }

    pub(crate) fn invalid_period(name: &'static str, period: usize, reason: &'static str) -> Self {
        Self::invalid(name, period as f64, reason)
    }
}

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Reject a zero period.
pub(crate) fn require_period(name: &'static str, period: usize) -> Result<()> {
    if period == 0 {
        return Err(IndicatorError::invalid_period(name, period, "period must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_parameter_and_reason() {
        let err = IndicatorError::invalid_period("rsi.period", 0, "period must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid parameter `rsi.period` = 0: period must be at least 1"
        );
    }

    #[test]
    fn require_period_accepts_one() {
        assert!(require_period("sma.period", 1).is_ok());
        assert!(require_period("sma.period", 0).is_err());
    }
}
