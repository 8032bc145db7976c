// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Read endpoints are public; the settings
// update requires a valid Bearer token checked via the `AdminBearer`
// extractor.
//
// CORS is configured permissively so the chart front end can be served from
// anywhere during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::auth::AdminBearer;
use crate::app_state::{AppState, RecomputeError};
use crate::indicators::IndicatorConfig;
use crate::overlay::Overlay;
use crate::recompute::RequestToken;
use crate::runtime_config::{Preferences, PERIOD_DAYS_RANGE};
use crate::types::Theme;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/history", get(history))
        .route("/api/v1/indicators", get(indicators))
        .route("/api/v1/overlay/latest", get(latest_overlay))
        .route("/api/v1/live-price", get(live_price))
        .route("/api/v1/errors", get(recent_errors))
        // ── Settings (POST authenticated) ───────────────────────────
        .route("/api/v1/settings", get(get_settings).post(update_settings))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
    demo_feed: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
        demo_feed: state.feed.is_demo(),
    })
}

// =============================================================================
// History
// =============================================================================

#[derive(Deserialize)]
struct PeriodQuery {
    period: Option<u32>,
}

fn resolve_period(state: &AppState, requested: Option<u32>) -> Result<u32, ApiError> {
    let period = requested.unwrap_or_else(|| state.preferences().default_period_days);
    if !PERIOD_DAYS_RANGE.contains(&period) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("period must be between 1 and 3650 days, got {period}"),
        ));
    }
    Ok(period)
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = resolve_period(&state, query.period)?;
    match state.feed.history(period).await {
        Ok(series) => Ok(Json(series)),
        Err(e) => {
            warn!(error = %e, period, "historical data fetch failed");
            state.push_error(format!("historical data fetch failed: {e:#}"));
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                "Failed to fetch historical data",
            ))
        }
    }
}

// =============================================================================
// Indicators
// =============================================================================

/// Chart window plus one-off parameter overrides. Overrides apply to this
/// request only; the stored settings are untouched.
#[derive(Deserialize, Default)]
struct IndicatorQuery {
    period: Option<u32>,
    rsi_period: Option<usize>,
    sma_period: Option<usize>,
    macd_fast: Option<usize>,
    macd_slow: Option<usize>,
    macd_signal: Option<usize>,
    bollinger_period: Option<usize>,
    bollinger_multiplier: Option<f64>,
}

impl IndicatorQuery {
    fn apply(&self, mut config: IndicatorConfig) -> IndicatorConfig {
        macro_rules! override_param {
            ($field:ident, $($target:ident).+) => {
                if let Some(val) = self.$field {
                    config.$($target).+ = val;
                }
            };
        }

        override_param!(rsi_period, rsi.period);
        override_param!(sma_period, sma.period);
        override_param!(macd_fast, macd.fast_period);
        override_param!(macd_slow, macd.slow_period);
        override_param!(macd_signal, macd.signal_period);
        override_param!(bollinger_period, bollinger.period);
        override_param!(bollinger_multiplier, bollinger.multiplier);
        config
    }
}

#[derive(Serialize)]
struct OverlayResponse<'a> {
    token: RequestToken,
    #[serde(flatten)]
    overlay: &'a Overlay,
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndicatorQuery>,
) -> Result<Response, ApiError> {
    let period = resolve_period(&state, query.period)?;
    let config = query.apply(state.indicator_config());

    match state.recompute(period, config).await {
        Ok(committed) => Ok(Json(OverlayResponse {
            token: committed.token,
            overlay: &committed.value,
        })
        .into_response()),
        Err(e @ RecomputeError::InvalidParameter(_)) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ RecomputeError::Superseded(_)) => {
            Err(api_error(StatusCode::CONFLICT, e.to_string()))
        }
        Err(e @ RecomputeError::Fetch(_)) => {
            Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

async fn latest_overlay(State(state): State<Arc<AppState>>) -> Response {
    match state.overlays.latest() {
        Some(committed) => Json(OverlayResponse {
            token: committed.token,
            overlay: &committed.value,
        })
        .into_response(),
        None => Json(serde_json::Value::Null).into_response(),
    }
}

// =============================================================================
// Live price
// =============================================================================

async fn live_price(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let quote = state.live_quote.read().clone();
    quote.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No live price available yet",
        )
    })
}

// =============================================================================
// Errors
// =============================================================================

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_errors.read().clone())
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Serialize)]
struct SettingsResponse {
    preferences: Preferences,
    indicators: IndicatorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<Vec<String>>,
}

async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read();
    Json(SettingsResponse {
        preferences: config.preferences.clone(),
        indicators: config.indicators,
        changes: None,
    })
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsUpdate {
    theme: Option<Theme>,
    currency: Option<String>,
    refresh_rate_minutes: Option<u32>,
    default_period_days: Option<u32>,
    rsi_enabled: Option<bool>,
    rsi_period: Option<usize>,
    sma_enabled: Option<bool>,
    sma_period: Option<usize>,
    macd_enabled: Option<bool>,
    macd_fast_period: Option<usize>,
    macd_slow_period: Option<usize>,
    macd_signal_period: Option<usize>,
    bollinger_enabled: Option<bool>,
    bollinger_period: Option<usize>,
    bollinger_multiplier: Option<f64>,
}

async fn update_settings(
    _auth: AdminBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let mut config = state.config.write();
    let mut candidate = config.clone();
    let mut changes = Vec::new();

    macro_rules! apply_setting {
        ($update_field:ident, $($target:ident).+) => {
            if let Some(val) = update.$update_field.clone() {
                if candidate.$($target).+ != val {
                    changes.push(format!(
                        "{}: {} -> {}",
                        stringify!($update_field),
                        candidate.$($target).+,
                        val
                    ));
                    candidate.$($target).+ = val;
                }
            }
        };
    }

    apply_setting!(theme, preferences.theme);
    apply_setting!(refresh_rate_minutes, preferences.refresh_rate_minutes);
    apply_setting!(default_period_days, preferences.default_period_days);
    apply_setting!(rsi_enabled, indicators.rsi.enabled);
    apply_setting!(rsi_period, indicators.rsi.period);
    apply_setting!(sma_enabled, indicators.sma.enabled);
    apply_setting!(sma_period, indicators.sma.period);
    apply_setting!(macd_enabled, indicators.macd.enabled);
    apply_setting!(macd_fast_period, indicators.macd.fast_period);
    apply_setting!(macd_slow_period, indicators.macd.slow_period);
    apply_setting!(macd_signal_period, indicators.macd.signal_period);
    apply_setting!(bollinger_enabled, indicators.bollinger.enabled);
    apply_setting!(bollinger_period, indicators.bollinger.period);
    apply_setting!(bollinger_multiplier, indicators.bollinger.multiplier);

    let currency = update.currency.as_deref().map(|c| c.trim().to_uppercase());
    if let Some(currency) = currency {
        if candidate.preferences.currency != currency {
            changes.push(format!(
                "currency: {} -> {}",
                candidate.preferences.currency, currency
            ));
            candidate.preferences.currency = currency;
        }
    }

    let problems = candidate.preferences.problems();
    if !problems.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, problems.join("; ")));
    }
    if let Err(e) = candidate.indicators.validate() {
        return Err(api_error(StatusCode::BAD_REQUEST, e.to_string()));
    }

    let quote_affected = candidate.preferences.currency != config.preferences.currency
        || candidate.preferences.refresh_rate_minutes != config.preferences.refresh_rate_minutes;

    *config = candidate;
    let response = SettingsResponse {
        preferences: config.preferences.clone(),
        indicators: config.indicators,
        changes: Some(changes),
    };
    drop(config);

    if let Some(changes) = response.changes.as_ref().filter(|c| !c.is_empty()) {
        info!(?changes, "Settings updated");
        state.increment_version();
        if quote_affected {
            state.refresh_now();
        }
    }

    Ok(Json(response))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::DashboardConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use crate::test_support::{state_with_slow_history, wait_for_tokens, SLOW_PERIOD};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state =
            Arc::new(AppState::new(DashboardConfig::default(), Some("secret".into())).unwrap());
        (router(state.clone()), state)
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_settings(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/settings")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        let (status, body) = call(app, get_req("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["demo_feed"], true);
    }

    #[tokio::test]
    async fn history_uses_requested_period() {
        let (app, _) = app();
        let (status, body) = call(app, get_req("/api/v1/history?period=7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn history_rejects_zero_period() {
        let (app, _) = app();
        let (status, _) = call(app, get_req("/api/v1/history?period=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn indicators_are_aligned_with_labels() {
        let (app, state) = app();
        let (status, body) = call(app, get_req("/api/v1/indicators?period=90")).await;
        assert_eq!(status, StatusCode::OK);
        let labels = body["labels"].as_array().unwrap().len();
        assert_eq!(labels, 90);
        assert_eq!(body["rsi"].as_array().unwrap().len(), labels);
        assert_eq!(body["macd"]["histogram"].as_array().unwrap().len(), labels);
        assert!(body["rsi"][0].is_null());
        assert_eq!(body["token"], 1);
        assert!(state.overlays.latest().is_some());
    }

    #[tokio::test]
    async fn indicator_overrides_do_not_touch_settings() {
        let (app, state) = app();
        let (status, body) = call(app, get_req("/api/v1/indicators?rsi_period=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["rsi"]["period"], 5);
        assert_eq!(state.indicator_config().rsi.period, 14);
    }

    #[tokio::test]
    async fn inverted_macd_is_bad_request() {
        let (app, _) = app();
        let (status, body) =
            call(app, get_req("/api/v1/indicators?macd_fast=26&macd_slow=12")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("macd.fast_period"));
    }

    #[tokio::test]
    async fn latest_overlay_is_null_before_first_recompute() {
        let (app, _) = app();
        let (status, body) = call(app, get_req("/api/v1/overlay/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn live_price_unavailable_until_first_refresh() {
        let (app, _) = app();
        let (status, _) = call(app, get_req("/api/v1/live-price")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn settings_update_requires_token() {
        let (app, _) = app();
        let (status, _) = call(
            app.clone(),
            post_settings(None, serde_json::json!({ "theme": "dark" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            app,
            post_settings(Some("wrong"), serde_json::json!({ "theme": "dark" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn settings_update_applies_and_reports_changes() {
        let (app, state) = app();
        let (status, body) = call(
            app,
            post_settings(
                Some("secret"),
                serde_json::json!({ "theme": "dark", "currency": "myr", "rsi_period": 21 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preferences"]["theme"], "dark");
        assert_eq!(body["changes"].as_array().unwrap().len(), 3);
        assert_eq!(state.preferences().currency, "MYR");
        assert_eq!(state.indicator_config().rsi.period, 21);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_atomically() {
        let (app, state) = app();
        let (status, _) = call(
            app,
            post_settings(
                Some("secret"),
                serde_json::json!({ "theme": "dark", "refresh_rate_minutes": 90 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.preferences().theme, Theme::Light);
        assert_eq!(state.preferences().refresh_rate_minutes, 5);
    }

    #[tokio::test]
    async fn invalid_indicator_settings_are_rejected() {
        let (app, state) = app();
        let (status, _) = call(
            app,
            post_settings(Some("secret"), serde_json::json!({ "bollinger_period": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.indicator_config().bollinger.period, 20);
    }

    #[tokio::test]
    async fn stale_indicator_request_is_conflict() {
        let state = Arc::new(state_with_slow_history().await);
        let app = router(state.clone());

        let slow = tokio::spawn(call(
            app.clone(),
            get_req(&format!("/api/v1/indicators?period={SLOW_PERIOD}")),
        ));
        wait_for_tokens(&state, 1).await;

        let (status, body) = call(app, get_req("/api/v1/indicators?period=7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], 2);

        let (status, body) = slow.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("superseded"));
        assert_eq!(state.overlays.latest().unwrap().token.value(), 2);
    }

    #[tokio::test]
    async fn oversized_period_override_is_bad_request() {
        let (app, _) = app();
        let (status, body) =
            call(app, get_req("/api/v1/indicators?rsi_period=18446744073709551615")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("rsi.period"));
    }

    #[tokio::test]
    async fn latest_overlay_serialises_committed_result() {
        let (app, state) = app();
        state.recompute(14, state.indicator_config()).await.unwrap();
        let (status, body) = call(app, get_req("/api/v1/overlay/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], 1);
        assert_eq!(body["labels"].as_array().unwrap().len(), 14);
    }
}
