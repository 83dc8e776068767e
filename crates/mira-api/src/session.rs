//! The session cookie. One httpOnly cookie carries an HMAC-signed
//! token (HS256) whose claims name the identity and whether it is a
//! guest; inspecting a request can therefore only yield a consistent
//! `Anonymous | Guest | Authenticated`, never a half-valid pair of
//! cookies. Lifecycle: minted at login/registration/guest entry,
//! cleared at logout, never rotated mid-session.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};
use uuid::Uuid;

use mira_types::session::{SessionClaims, SessionState};

pub const SESSION_COOKIE: &str = "mira_session";

const USER_TTL_DAYS: i64 = 7;
const GUEST_TTL_DAYS: i64 = 1;

#[derive(Clone)]
pub struct SessionGate {
    secret: String,
    /// Set the Secure attribute; on in production, off for local http.
    secure: bool,
}

impl SessionGate {
    pub fn new(secret: impl Into<String>, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            secure,
        }
    }

    /// Mint a 7-day session cookie for an authenticated user.
    pub fn issue_user(&self, user_id: Uuid) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        let token = self.sign(user_id.to_string(), false, USER_TTL_DAYS)?;
        Ok(self.cookie(token, time::Duration::days(USER_TTL_DAYS)))
    }

    /// Mint a 1-day guest session. Returns the guest marker alongside
    /// the cookie so the handler can echo it in the response body.
    pub fn issue_guest(&self) -> Result<(String, Cookie<'static>), jsonwebtoken::errors::Error> {
        let marker = format!("guest_{}", chrono::Utc::now().timestamp_millis());
        let token = self.sign(marker.clone(), true, GUEST_TTL_DAYS)?;
        Ok((marker, self.cookie(token, time::Duration::days(GUEST_TTL_DAYS))))
    }

    /// Resolve the request's cookies to a session state. Anything that
    /// fails signature or expiry checks degrades to `Anonymous` — a
    /// bad cookie is not an error, just not an identity.
    pub fn inspect(&self, jar: &CookieJar) -> SessionState {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return SessionState::Anonymous;
        };

        let claims = match decode::<SessionClaims>(
            cookie.value(),
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("session token rejected: {e}");
                return SessionState::Anonymous;
            }
        };

        if claims.guest {
            SessionState::Guest(claims.sub)
        } else {
            match claims.sub.parse::<Uuid>() {
                Ok(user_id) => SessionState::Authenticated(user_id),
                Err(e) => {
                    warn!("signed session token carries a non-uuid subject: {e}");
                    SessionState::Anonymous
                }
            }
        }
    }

    /// A removal cookie: same attributes, empty value, zero max-age.
    pub fn revoke(&self) -> Cookie<'static> {
        self.cookie(String::new(), time::Duration::ZERO)
    }

    fn sign(
        &self,
        sub: String,
        guest: bool,
        ttl_days: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sub,
            guest,
            exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    fn cookie(&self, value: String, max_age: time::Duration) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SessionGate {
        SessionGate::new("test-secret", false)
    }

    fn jar_with(cookie: Cookie<'static>) -> CookieJar {
        CookieJar::new().add(cookie)
    }

    #[test]
    fn user_cookie_roundtrip() {
        let gate = gate();
        let user_id = Uuid::new_v4();
        let cookie = gate.issue_user(user_id).unwrap();

        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));

        let state = gate.inspect(&jar_with(cookie));
        assert_eq!(state, SessionState::Authenticated(user_id));
    }

    #[test]
    fn guest_cookie_roundtrip() {
        let gate = gate();
        let (marker, cookie) = gate.issue_guest().unwrap();
        assert!(marker.starts_with("guest_"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(1)));

        let state = gate.inspect(&jar_with(cookie));
        assert_eq!(state, SessionState::Guest(marker));
    }

    #[test]
    fn no_cookie_is_anonymous() {
        assert_eq!(gate().inspect(&CookieJar::new()), SessionState::Anonymous);
    }

    #[test]
    fn tampered_token_is_anonymous() {
        let gate = gate();
        let cookie = gate.issue_user(Uuid::new_v4()).unwrap();
        let mut forged = cookie.value().to_string();
        forged.pop();
        forged.push('x');

        let jar = jar_with(Cookie::new(SESSION_COOKIE, forged));
        assert_eq!(gate.inspect(&jar), SessionState::Anonymous);
    }

    #[test]
    fn token_signed_with_a_different_secret_is_anonymous() {
        let cookie = SessionGate::new("other-secret", false)
            .issue_user(Uuid::new_v4())
            .unwrap();
        assert_eq!(gate().inspect(&jar_with(cookie)), SessionState::Anonymous);
    }

    #[test]
    fn expired_token_is_anonymous() {
        let gate = gate();
        // exp well past the default validation leeway
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            guest: false,
            exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        let jar = jar_with(Cookie::new(SESSION_COOKIE, token));
        assert_eq!(gate.inspect(&jar), SessionState::Anonymous);
    }

    #[test]
    fn revoke_clears_the_cookie() {
        let cookie = gate().revoke();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
