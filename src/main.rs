// =============================================================================
// Gold Pulse — Main Entry Point
// =============================================================================
//
// Loads the dashboard config, starts the live price refresh loop, computes the
// initial overlay and serves the REST API until Ctrl+C.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gold_pulse::api;
use gold_pulse::app_state::AppState;
use gold_pulse::live_price;
use gold_pulse::runtime_config::DashboardConfig;

const CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Gold Pulse — Starting Up                          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = DashboardConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DashboardConfig::default()
    });
    config.apply_env_overrides();
    config.sanitize();

    let default_period = config.preferences.default_period_days;
    info!(
        currency = %config.preferences.currency,
        theme = %config.preferences.theme,
        refresh_rate_minutes = config.preferences.refresh_rate_minutes,
        default_period_days = default_period,
        "Preferences in effect"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let admin_token = std::env::var("GOLD_ADMIN_TOKEN").ok();
    let state = Arc::new(AppState::new(config, admin_token)?);
    if state.feed.is_demo() {
        warn!("GOLD_HISTORY_URL not set — serving generated demo prices");
    }
    if state.admin_token.is_none() {
        warn!("GOLD_ADMIN_TOKEN not set — settings are read-only");
    }

    // ── 3. Live price refresh loop ───────────────────────────────────────
    tokio::spawn(live_price::run_refresh_loop(state.clone()));

    // ── 4. Initial overlay ───────────────────────────────────────────────
    let init_state = state.clone();
    tokio::spawn(async move {
        let config = init_state.indicator_config();
        match init_state.recompute(default_period, config).await {
            Ok(committed) => info!(token = %committed.token, "Initial overlay ready"),
            Err(e) => error!(error = %e, "Initial overlay failed"),
        }
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("GOLD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            warn!("Shutdown signal received — stopping gracefully");
        }
        served = server => {
            served.context("API server task panicked")?.context("API server failed")?;
        }
    }

    info!(uptime_secs = state.uptime_secs(), "Gold Pulse shut down complete.");
    Ok(())
}
