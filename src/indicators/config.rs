// =============================================================================
// Indicator Configuration
// =============================================================================
//
// A plain `Copy` value. Callers snapshot it and pass it by value into each
// computation, so a settings edit can never change parameters underneath an
// in-flight calculation.

use serde::{Deserialize, Serialize};

use super::error::{require_period, IndicatorError, Result};

fn default_true() -> bool {
    true
}

fn default_rsi_period() -> usize {
    14
}

fn default_sma_period() -> usize {
    30
}

fn default_fast_period() -> usize {
    12
}

fn default_slow_period() -> usize {
    26
}

fn default_signal_period() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rsi_period")]
    pub period: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: default_rsi_period(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sma_period")]
    pub period: usize,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: default_sma_period(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            signal_period: default_signal_period(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bollinger_period")]
    pub period: usize,
    /// Standard-deviation multiplier for the upper / lower band.
    #[serde(default = "default_bollinger_multiplier")]
    pub multiplier: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: default_bollinger_period(),
            multiplier: default_bollinger_multiplier(),
        }
    }
}

/// Longest lookback a stored or requested config may use: ten years of daily
/// prices, the widest chart window.
pub const MAX_LOOKBACK: usize = 3650;

fn bounded_period(name: &'static str, period: usize) -> Result<()> {
    require_period(name, period)?;
    if period > MAX_LOOKBACK {
        return Err(IndicatorError::invalid_period(
            name,
            period,
            "period exceeds the longest chart window (3650)",
        ));
    }
    Ok(())
}

/// Parameters and visibility toggles for every chart overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default)]
    pub rsi: RsiConfig,
    #[serde(default)]
    pub macd: MacdConfig,
    #[serde(default)]
    pub sma: SmaConfig,
    #[serde(default)]
    pub bollinger: BollingerConfig,
}

impl IndicatorConfig {
    /// Apply the same parameter rules the compute functions enforce, so a
    /// bad value is rejected when it is stored rather than on the next
    /// recomputation. Periods are also capped at [`MAX_LOOKBACK`]. Disabled
    /// indicators are checked too.
    pub fn validate(&self) -> Result<()> {
        bounded_period("rsi.period", self.rsi.period)?;
        bounded_period("sma.period", self.sma.period)?;
        bounded_period("macd.fast_period", self.macd.fast_period)?;
        bounded_period("macd.slow_period", self.macd.slow_period)?;
        bounded_period("macd.signal_period", self.macd.signal_period)?;
        bounded_period("bollinger.period", self.bollinger.period)?;
        if self.macd.fast_period >= self.macd.slow_period {
            return Err(IndicatorError::invalid_period(
                "macd.fast_period",
                self.macd.fast_period,
                "fast period must be shorter than slow period",
            ));
        }
        if self.bollinger.period < 2 {
            return Err(IndicatorError::invalid_period(
                "bollinger.period",
                self.bollinger.period,
                "period must be at least 2",
            ));
        }
        let m = self.bollinger.multiplier;
        if !m.is_finite() || m < 0.0 {
            return Err(IndicatorError::invalid(
                "bollinger.multiplier",
                m,
                "multiplier must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}
