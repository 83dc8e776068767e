//! The `/auth/*` surface. Handlers validate input, hand the work to
//! the auth services (hashing runs on the blocking pool), and translate
//! outcomes through `ApiError`. Session cookies are minted and cleared
//! here and nowhere else.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use tracing::error;
use uuid::Uuid;

use mira_auth::UserIdentity;
use mira_auth::repo::UserRepo;
use mira_types::api::{
    ConfirmSecurityRequest, LoginRequest, MeResponse, RegisterRequest, UpdatePasswordRequest,
    UpdateProfileRequest, UpdateSecurityRequest, UserResponse, VerifySecurityRequest,
    VerifySecurityResponse,
};
use mira_types::session::SessionState;

use crate::AppState;
use crate::error::ApiError;

fn identity_response(identity: UserIdentity) -> UserResponse {
    UserResponse {
        id: identity.id,
        email: identity.email,
        name: identity.name,
    }
}

/// Password hashing blocks for tens of milliseconds; anything that
/// hashes runs on the blocking pool, not the async executor.
async fn run_blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => {
            error!("blocking auth task failed: {e}");
            Err(ApiError::Internal)
        }
    }
}

fn require_user(state: &AppState, jar: &CookieJar) -> Result<Uuid, ApiError> {
    match state.sessions.inspect(jar) {
        SessionState::Authenticated(user_id) => Ok(user_id),
        _ => Err(ApiError::Unauthorized),
    }
}

fn require_field(value: &str, name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{name} is required")));
    }
    Ok(())
}

fn session_cookie_or_internal(
    result: Result<axum_extra::extract::cookie::Cookie<'static>, jsonwebtoken::errors::Error>,
) -> Result<axum_extra::extract::cookie::Cookie<'static>, ApiError> {
    result.map_err(|e| {
        error!("session token signing failed: {e}");
        ApiError::Internal
    })
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    require_field(&req.email, "email")?;
    require_field(&req.name, "name")?;
    require_field(&req.password, "password")?;

    let credentials = state.credentials.clone();
    let identity =
        run_blocking(move || credentials.register(&req.email, &req.name, &req.password)).await?;

    let cookie = session_cookie_or_internal(state.sessions.issue_user(identity.id))?;
    Ok((jar.add(cookie), Json(identity_response(identity))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    require_field(&req.email, "email")?;
    require_field(&req.password, "password")?;

    let credentials = state.credentials.clone();
    let identity = run_blocking(move || credentials.authenticate(&req.email, &req.password)).await?;

    let cookie = session_cookie_or_internal(state.sessions.issue_user(identity.id))?;
    Ok((jar.add(cookie), Json(identity_response(identity))))
}

pub async fn guest(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MeResponse>), ApiError> {
    let (marker, cookie) = state.sessions.issue_guest().map_err(|e| {
        error!("session token signing failed: {e}");
        ApiError::Internal
    })?;

    Ok((
        jar.add(cookie),
        Json(MeResponse {
            id: marker,
            name: "Guest".to_string(),
            email: String::new(),
            is_guest: true,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(state.sessions.revoke()), StatusCode::OK)
}

pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<MeResponse>, ApiError> {
    match state.sessions.inspect(&jar) {
        SessionState::Authenticated(user_id) => {
            let user = state
                .db
                .find_by_id(user_id)?
                .ok_or(ApiError::Unauthorized)?;
            Ok(Json(MeResponse {
                id: user.id.to_string(),
                name: user.name,
                email: user.email,
                is_guest: false,
            }))
        }
        SessionState::Guest(marker) => Ok(Json(MeResponse {
            id: marker,
            name: "Guest".to_string(),
            email: String::new(),
            is_guest: true,
        })),
        SessionState::Anonymous => Err(ApiError::Unauthorized),
    }
}

pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = require_user(&state, &jar)?;
    require_field(&req.current_password, "currentPassword")?;
    require_field(&req.new_password, "newPassword")?;

    let credentials = state.credentials.clone();
    run_blocking(move || {
        credentials.change_password(user_id, &req.current_password, &req.new_password)
    })
    .await?;

    Ok(StatusCode::OK)
}

pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = require_user(&state, &jar)?;
    require_field(&req.name, "name")?;
    require_field(&req.email, "email")?;

    let identity = state.credentials.update_profile(user_id, &req.name, &req.email)?;
    Ok(Json(identity_response(identity)))
}

pub async fn update_security(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<UpdateSecurityRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = require_user(&state, &jar)?;
    require_field(&req.question, "question")?;
    require_field(&req.answer, "answer")?;

    let vault = state.vault.clone();
    run_blocking(move || vault.set_question(user_id, &req.question, &req.answer)).await?;

    Ok(StatusCode::OK)
}

pub async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let user_id = require_user(&state, &jar)?;

    state.credentials.delete_account(user_id)?;
    Ok((jar.add(state.sessions.revoke()), StatusCode::OK))
}

/// Recovery step 1: look up the security question for an email. The
/// 404 is uniform whether the email is unknown or the account never
/// set a question.
pub async fn verify_security(
    State(state): State<AppState>,
    Json(req): Json<VerifySecurityRequest>,
) -> Result<Json<VerifySecurityResponse>, ApiError> {
    require_field(&req.email, "email")?;

    let prompt = state.recovery.request_recovery(&req.email)?;
    Ok(Json(VerifySecurityResponse {
        security_question: prompt.question,
        user_email: prompt.masked_email,
        user_name: prompt.masked_name,
    }))
}

/// Recovery step 2: check the answer and, on success, mint a session.
pub async fn confirm_security(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ConfirmSecurityRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    require_field(&req.email, "email")?;
    require_field(&req.answer, "answer")?;

    let recovery = state.recovery.clone();
    let identity = run_blocking(move || recovery.confirm_recovery(&req.email, &req.answer)).await?;

    let cookie = session_cookie_or_internal(state.sessions.issue_user(identity.id))?;
    Ok((jar.add(cookie), Json(identity_response(identity))))
}
