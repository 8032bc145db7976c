// Shared fixtures for tests that need a real upstream over HTTP.

use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::Query, routing::get, Json, Router};
use chrono::NaiveDate;

use crate::app_state::AppState;
use crate::runtime_config::DashboardConfig;

/// History requests for this many days are held back by [`SLOW_DELAY`].
pub const SLOW_PERIOD: u32 = 30;
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn history(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    if params.get("period") == Some(&SLOW_PERIOD.to_string()) {
        tokio::time::sleep(SLOW_DELAY).await;
    }
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let points: Vec<_> = (0..90)
        .map(|i| {
            serde_json::json!({
                "date": start + chrono::Duration::days(i),
                "price": 2000.0 + (i as f64 / 3.0).sin() * 12.0,
            })
        })
        .collect();
    Json(serde_json::Value::Array(points))
}

/// State whose history feed answers `SLOW_PERIOD` requests late and every
/// other period at once.
pub async fn state_with_slow_history() -> AppState {
    let base = serve(Router::new().route("/history", get(history))).await;
    let mut config = DashboardConfig::default();
    config.feed.history_url = Some(format!("{base}/history"));
    AppState::new(config, Some("secret".into())).unwrap()
}

/// Wait until `n` recompute tokens have been issued.
pub async fn wait_for_tokens(state: &AppState, n: u64) {
    while state.overlays.newest().value() < n {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
