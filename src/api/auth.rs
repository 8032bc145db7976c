// =============================================================================
// Bearer Token Authentication — Axum Extractor
// =============================================================================
//
// Guards the settings-mutating endpoints. The expected token is read from
// `GOLD_ADMIN_TOKEN` once at startup and kept in `AppState`; when it is unset
// every guarded request is rejected. Comparison is performed in constant time.
//
// Usage as an Axum extractor:
//
//   async fn handler(_auth: AdminBearer, ...) { ... }
// =============================================================================

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app_state::AppState;

// =============================================================================
// Constant-time comparison
// =============================================================================

/// Compare two byte slices in constant time. Returns `true` if they are
/// identical. Every byte is examined even after a mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// =============================================================================
// Extractor
// =============================================================================

/// Proof that the request carried a valid `Authorization: Bearer <token>`.
pub struct AdminBearer;

/// Rejection type returned when authentication fails.
pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminBearer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            warn!("GOLD_ADMIN_TOKEN is not set — settings updates are disabled");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Server authentication not configured",
            });
        };

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            warn!("Missing or malformed Authorization header");
            return Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "Missing or invalid authorization token",
            });
        };

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            warn!("Invalid admin token presented");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Invalid authorization token",
            });
        }

        Ok(AdminBearer)
    }
}

// =============================================================================
// Tests
// =============================================================================
