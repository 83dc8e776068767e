use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use mira_api::generate::HttpGenerator;
use mira_api::session::SessionGate;
use mira_api::{AppState, AppStateInner, auth, chat, guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mira=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let session_secret =
        std::env::var("MIRA_SESSION_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    if session_secret == "dev-secret-change-me" {
        warn!("MIRA_SESSION_SECRET is unset, using the dev default");
    }
    let secure_cookies = std::env::var("MIRA_SECURE_COOKIES")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    let db_path = std::env::var("MIRA_DB_PATH").unwrap_or_else(|_| "mira.db".into());
    let host = std::env::var("MIRA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MIRA_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let generate_url = std::env::var("MIRA_GENERATE_URL")
        .unwrap_or_else(|_| "http://localhost:11434/v1/chat/completions".into());
    let generate_model =
        std::env::var("MIRA_GENERATE_MODEL").unwrap_or_else(|_| "llama3".into());
    let generate_key = std::env::var("MIRA_GENERATE_KEY").ok();

    // Init database
    let db = Arc::new(mira_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let sessions = SessionGate::new(session_secret, secure_cookies);
    let generator = Arc::new(HttpGenerator::new(generate_url, generate_model, generate_key));
    let state: AppState = Arc::new(AppStateInner::new(db, sessions, generator));

    // Routes
    let app = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/guest", post(auth::guest))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/update-password", post(auth::update_password))
        .route("/auth/update-profile", post(auth::update_profile))
        .route("/auth/update-security", post(auth::update_security))
        .route("/auth/delete-account", delete(auth::delete_account))
        .route("/auth/verify-security", post(auth::verify_security))
        .route("/auth/confirm-security", post(auth::confirm_security))
        .route("/chats", get(chat::list_chats).post(chat::create_chat))
        .route("/chats/{chat_id}", delete(chat::delete_chat))
        .route(
            "/chats/{chat_id}/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::access_guard,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Mira server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
