//! Path-based access policy, evaluated before any handler runs. The
//! policy itself is a pure function of (path, session state); the
//! middleware wrapper only reads cookies and issues redirects.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tracing::debug;

use mira_types::session::SessionState;

use crate::AppState;

pub const ROOT_PATH: &str = "/";
pub const CHAT_PATH: &str = "/chat";
pub const LOGIN_PATH: &str = "/login";
pub const PROTECTED_PREFIX: &str = "/app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

/// The routing policy:
/// - `/` and `/chat` always pass (those pages gate themselves).
/// - `/login` while already authenticated bounces to `/chat`.
/// - anything under `/app` needs a session (guest counts), else bounce
///   to `/login`.
/// - everything else passes untouched.
pub fn evaluate(path: &str, session: &SessionState) -> Decision {
    if path == ROOT_PATH || path == CHAT_PATH {
        return Decision::Allow;
    }

    if path == LOGIN_PATH && session.is_authenticated() {
        return Decision::Redirect(CHAT_PATH);
    }

    if under_protected_prefix(path) && !session.has_session() {
        return Decision::Redirect(LOGIN_PATH);
    }

    Decision::Allow
}

/// `/app` and `/app/...` only — `/apple` is a different path.
fn under_protected_prefix(path: &str) -> bool {
    path.strip_prefix(PROTECTED_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub async fn access_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let session = state.sessions.inspect(&jar);

    match evaluate(req.uri().path(), &session) {
        Decision::Allow => next.run(req).await,
        Decision::Redirect(target) => {
            debug!(path = req.uri().path(), "access guard redirecting to {target}");
            Redirect::to(target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn authed() -> SessionState {
        SessionState::Authenticated(Uuid::new_v4())
    }

    fn guest() -> SessionState {
        SessionState::Guest("guest_1724700000000".to_string())
    }

    #[test]
    fn root_and_chat_always_pass() {
        for session in [SessionState::Anonymous, guest(), authed()] {
            assert_eq!(evaluate("/", &session), Decision::Allow);
            assert_eq!(evaluate("/chat", &session), Decision::Allow);
        }
    }

    #[test]
    fn protected_prefix_requires_a_session() {
        assert_eq!(
            evaluate("/app/settings", &SessionState::Anonymous),
            Decision::Redirect(LOGIN_PATH)
        );
        assert_eq!(evaluate("/app/settings", &guest()), Decision::Allow);
        assert_eq!(evaluate("/app/settings", &authed()), Decision::Allow);
    }

    #[test]
    fn login_bounces_authenticated_users_away() {
        assert_eq!(evaluate("/login", &authed()), Decision::Redirect(CHAT_PATH));
        assert_eq!(evaluate("/login", &SessionState::Anonymous), Decision::Allow);
        assert_eq!(evaluate("/login", &guest()), Decision::Allow);
    }

    #[test]
    fn protected_prefix_matches_on_segment_boundaries() {
        assert_eq!(
            evaluate("/app", &SessionState::Anonymous),
            Decision::Redirect(LOGIN_PATH)
        );
        assert_eq!(
            evaluate("/app/", &SessionState::Anonymous),
            Decision::Redirect(LOGIN_PATH)
        );
        // a shared prefix is not the protected tree
        assert_eq!(evaluate("/apple", &SessionState::Anonymous), Decision::Allow);
        assert_eq!(
            evaluate("/application/settings", &SessionState::Anonymous),
            Decision::Allow
        );
    }

    #[test]
    fn unrelated_paths_pass_through() {
        assert_eq!(
            evaluate("/auth/login", &SessionState::Anonymous),
            Decision::Allow
        );
        assert_eq!(
            evaluate("/static/logo.svg", &SessionState::Anonymous),
            Decision::Allow
        );
    }
}
