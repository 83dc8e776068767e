//! Chat CRUD plus the assistant round-trip. Authenticated users only:
//! guests own no persisted data.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use mira_db::models::{ChatRow, MessageRow};
use mira_types::api::{ChatResponse, CreateChatRequest, MessageResponse, SendMessageRequest};
use mira_types::session::SessionState;

use crate::AppState;
use crate::error::ApiError;
use crate::generate::ChatTurn;

fn require_user(state: &AppState, jar: &CookieJar) -> Result<Uuid, ApiError> {
    match state.sessions.inspect(jar) {
        SessionState::Authenticated(user_id) => Ok(user_id),
        _ => Err(ApiError::Unauthorized),
    }
}

fn chat_response(row: ChatRow) -> Result<ChatResponse, ApiError> {
    Ok(ChatResponse {
        id: row.id.parse().map_err(|_| ApiError::Internal)?,
        title: row.title,
        created_at: row.created_at,
    })
}

fn message_response(row: MessageRow) -> Result<MessageResponse, ApiError> {
    Ok(MessageResponse {
        id: row.id.parse().map_err(|_| ApiError::Internal)?,
        chat_id: row.chat_id.parse().map_err(|_| ApiError::Internal)?,
        role: row.role,
        content: row.content,
        created_at: row.created_at,
    })
}

/// Load a chat and check the caller owns it. A chat that exists but
/// belongs to someone else reads as 404, not 403.
fn owned_chat(state: &AppState, chat_id: Uuid, user_id: Uuid) -> Result<ChatRow, ApiError> {
    let chat = state
        .db
        .get_chat(&chat_id.to_string())
        .map_err(|e| {
            warn!("chat lookup failed: {e:#}");
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("chat not found".into()))?;

    if chat.user_id != user_id.to_string() {
        return Err(ApiError::NotFound("chat not found".into()));
    }
    Ok(chat)
}

pub async fn list_chats(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<ChatResponse>>, ApiError> {
    let user_id = require_user(&state, &jar)?;

    let rows = state
        .db
        .get_chats_for_user(&user_id.to_string())
        .map_err(|e| {
            warn!("chat list failed: {e:#}");
            ApiError::Internal
        })?;

    rows.into_iter().map(chat_response).collect::<Result<_, _>>().map(Json)
}

pub async fn create_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ApiError> {
    let user_id = require_user(&state, &jar)?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }

    let chat_id = Uuid::new_v4();
    state
        .db
        .create_chat(&chat_id.to_string(), &user_id.to_string(), title)
        .map_err(|e| {
            warn!("chat create failed: {e:#}");
            ApiError::Internal
        })?;

    let row = owned_chat(&state, chat_id, user_id)?;
    Ok((StatusCode::CREATED, Json(chat_response(row)?)))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = require_user(&state, &jar)?;
    owned_chat(&state, chat_id, user_id)?;

    state.db.delete_chat(&chat_id.to_string()).map_err(|e| {
        warn!("chat delete failed: {e:#}");
        ApiError::Internal
    })?;
    Ok(StatusCode::OK)
}

pub async fn list_messages(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let user_id = require_user(&state, &jar)?;
    owned_chat(&state, chat_id, user_id)?;

    let rows = state.db.get_messages(&chat_id.to_string()).map_err(|e| {
        warn!("message list failed: {e:#}");
        ApiError::Internal
    })?;

    rows.into_iter().map(message_response).collect::<Result<_, _>>().map(Json)
}

/// Store the user's message, ask the backend for a reply with the
/// prior conversation as context, store and return the reply.
pub async fn send_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = require_user(&state, &jar)?;
    owned_chat(&state, chat_id, user_id)?;

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("content is required".into()));
    }

    let chat_key = chat_id.to_string();
    let history: Vec<ChatTurn> = state
        .db
        .get_messages(&chat_key)
        .map_err(|e| {
            warn!("history load failed: {e:#}");
            ApiError::Internal
        })?
        .into_iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content,
        })
        .collect();

    state
        .db
        .insert_message(&Uuid::new_v4().to_string(), &chat_key, "user", &content)
        .map_err(|e| {
            warn!("message insert failed: {e:#}");
            ApiError::Internal
        })?;

    let reply = state
        .generator
        .generate(&content, &history)
        .await
        .map_err(|e| {
            warn!("generation failed: {e:#}");
            ApiError::Upstream
        })?;

    let reply_id = Uuid::new_v4();
    state
        .db
        .insert_message(&reply_id.to_string(), &chat_key, "assistant", &reply)
        .map_err(|e| {
            warn!("reply insert failed: {e:#}");
            ApiError::Internal
        })?;

    let stored = state
        .db
        .get_messages(&chat_key)
        .map_err(|e| {
            warn!("reply readback failed: {e:#}");
            ApiError::Internal
        })?
        .into_iter()
        .rev()
        .find(|m| m.id == reply_id.to_string())
        .ok_or(ApiError::Internal)?;

    Ok(Json(message_response(stored)?))
}
