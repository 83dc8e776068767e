//! HTTP error mapping. One taxonomy, applied everywhere: validation
//! 400, bad credentials 401 (always the same words), not-found 404,
//! conflicts 409, store/hash failures 500 with the detail only in the
//! logs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use mira_auth::error::{
    AuthError, PasswordChangeError, PersistenceError, ProfileError, RecoveryError, RegisterError,
    VaultError,
};
use mira_types::api::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthorized,
    NotFound(String),
    Conflict(String),
    Internal,
    Upstream,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                msg.clone()
            }
            ApiError::Unauthorized => "invalid credentials".to_string(),
            ApiError::Internal => "something went wrong".to_string(),
            ApiError::Upstream => "assistant is unavailable".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        error!("store failure surfaced to handler: {e}");
        ApiError::Internal
    }
}

impl From<RegisterError> for ApiError {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::DuplicateEmail => ApiError::Conflict("email already registered".into()),
            RegisterError::WeakPassword(min) => {
                ApiError::Validation(format!("password must be at least {min} characters"))
            }
            RegisterError::Hashing(e) => {
                error!("hashing failure during registration: {e}");
                ApiError::Internal
            }
            RegisterError::Persistence(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized,
            AuthError::Hashing(e) => {
                error!("hashing failure during login: {e}");
                ApiError::Internal
            }
            AuthError::Persistence(e) => e.into(),
        }
    }
}

impl From<PasswordChangeError> for ApiError {
    fn from(e: PasswordChangeError) -> Self {
        match e {
            PasswordChangeError::UnknownUser => ApiError::Unauthorized,
            PasswordChangeError::WrongCurrentPassword => {
                ApiError::Validation("current password is incorrect".into())
            }
            PasswordChangeError::WeakPassword(min) => {
                ApiError::Validation(format!("password must be at least {min} characters"))
            }
            PasswordChangeError::Hashing(e) => {
                error!("hashing failure during password change: {e}");
                ApiError::Internal
            }
            PasswordChangeError::Persistence(e) => e.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::UnknownUser => ApiError::Unauthorized,
            ProfileError::EmailTaken => ApiError::Conflict("email already in use".into()),
            ProfileError::Persistence(e) => e.into(),
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::Hashing(e) => {
                error!("hashing failure in security question vault: {e}");
                ApiError::Internal
            }
            VaultError::Persistence(e) => e.into(),
        }
    }
}

impl From<RecoveryError> for ApiError {
    fn from(e: RecoveryError) -> Self {
        match e {
            // Uniform to the end user: unknown email and question-less
            // account must be indistinguishable.
            RecoveryError::NotFound | RecoveryError::NoQuestionConfigured => {
                ApiError::NotFound("no recovery available for this address".into())
            }
            RecoveryError::AnswerRejected => ApiError::Unauthorized,
            RecoveryError::Hashing(e) => {
                error!("hashing failure during recovery: {e}");
                ApiError::Internal
            }
            RecoveryError::Persistence(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_recovery_misses_map_to_the_same_response() {
        let a = ApiError::from(RecoveryError::NotFound);
        let b = ApiError::from(RecoveryError::NoQuestionConfigured);
        assert_eq!(a.status(), b.status());
        assert_eq!(a.message(), b.message());
    }

    #[test]
    fn internal_errors_never_carry_detail() {
        let e = ApiError::from(PersistenceError("disk exploded: /var/db".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.message().contains("disk"));
    }
}
