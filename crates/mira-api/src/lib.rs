pub mod auth;
pub mod chat;
pub mod error;
pub mod generate;
pub mod guard;
pub mod session;

use std::sync::Arc;

use mira_auth::{CredentialService, RecoveryService, SecurityQuestionVault};
use mira_db::Database;

use crate::generate::TextGenerator;
use crate::session::SessionGate;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub credentials: CredentialService,
    pub recovery: RecoveryService,
    pub vault: SecurityQuestionVault,
    pub sessions: SessionGate,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, sessions: SessionGate, generator: Arc<dyn TextGenerator>) -> Self {
        let vault = SecurityQuestionVault::new(db.clone(), db.clone());
        let credentials = CredentialService::new(db.clone(), vault.clone());
        let recovery = RecoveryService::new(db.clone(), vault.clone());
        Self {
            db,
            credentials,
            recovery,
            vault,
            sessions,
            generator,
        }
    }
}
