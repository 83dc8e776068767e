use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed session token claims. Canonical definition lives here so the
/// API layer and any future gateway share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id for authenticated sessions, guest marker otherwise.
    pub sub: String,
    pub guest: bool,
    pub exp: usize,
}

/// What a request's cookie resolves to. A single tagged value — the
/// token-plus-guest-flag cookie pair cannot fall out of sync because
/// the pair does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No cookie, or a cookie that failed signature/expiry checks.
    Anonymous,
    /// Time-limited identity that owns no persisted data.
    Guest(String),
    Authenticated(Uuid),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Guest or authenticated — anything that may enter gated pages.
    pub fn has_session(&self) -> bool {
        !matches!(self, SessionState::Anonymous)
    }
}
