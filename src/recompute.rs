// =============================================================================
// Recompute Gate — last-request-wins
// =============================================================================
//
// Every recomputation (initial load, chart-window change, indicator-setting
// change) takes a token before it starts fetching. Tokens increase
// monotonically. When the result arrives it is committed only if no newer
// token has been issued in the meantime; otherwise it is dropped.
//
// The committed value is never replaced by one carrying an older token.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

/// Ticket identifying one recompute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A result arrived after a newer request had already been issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request {token} superseded by {latest}")]
pub struct Superseded {
    pub token: RequestToken,
    pub latest: RequestToken,
}

/// A committed result together with the token that produced it.
#[derive(Debug)]
pub struct Committed<T> {
    pub token: RequestToken,
    pub value: Arc<T>,
}

impl<T> Clone for Committed<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            value: Arc::clone(&self.value),
        }
    }
}

/// Issues tokens and keeps the newest committed result.
pub struct RecomputeGate<T> {
    issued: AtomicU64,
    latest: RwLock<Option<Committed<T>>>,
}

impl<T> Default for RecomputeGate<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }
}

impl<T> RecomputeGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token, superseding every earlier one.
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Newest token issued so far (0 before the first request).
    pub fn newest(&self) -> RequestToken {
        RequestToken(self.issued.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.newest() == token
    }

    /// Commit `value` if `token` is still the newest one issued.
    pub fn commit(&self, token: RequestToken, value: T) -> Result<Committed<T>, Superseded> {
        let mut latest = self.latest.write();

        let newest = self.newest();
        let older_than_committed = latest.as_ref().is_some_and(|c| c.token > token);
        if newest != token || older_than_committed {
            return Err(Superseded {
                token,
                latest: newest,
            });
        }

        let committed = Committed {
            token,
            value: Arc::new(value),
        };
        *latest = Some(committed.clone());
        Ok(committed)
    }

    /// Most recently committed result, if any.
    pub fn latest(&self) -> Option<Committed<T>> {
        self.latest.read().clone()
    }
}
