// =============================================================================
// Gold Pulse — gold price dashboard engine
// =============================================================================
//
// Historical and live gold prices with technical-indicator overlays (SMA,
// EMA, RSI, MACD, Bollinger Bands) served over a small REST API.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod indicators;
pub mod live_price;
pub mod overlay;
pub mod price_feed;
pub mod recompute;
pub mod runtime_config;
pub mod types;

#[cfg(test)]
mod test_support;
