//! Repository trait implementations. This is the seam between the
//! auth core and SQLite: records cross as typed values, errors cross
//! as `PersistenceError` with the driver detail left in the logs.

use anyhow::Error;
use tracing::{error, warn};
use uuid::Uuid;

use mira_auth::error::{PersistenceError, UserInsertError};
use mira_auth::repo::{QuestionRecord, QuestionRepo, UserRecord, UserRepo};

use crate::Database;
use crate::models::UserRow;

fn store_err(context: &str, e: Error) -> PersistenceError {
    error!("{context}: {e:#}");
    PersistenceError(context.to_string())
}

fn is_unique_violation(e: &Error) -> bool {
    e.downcast_ref::<rusqlite::Error>()
        .and_then(|e| e.sqlite_error_code())
        .is_some_and(|code| code == rusqlite::ErrorCode::ConstraintViolation)
}

fn row_to_record(row: UserRow) -> Result<UserRecord, PersistenceError> {
    let id = row.id.parse::<Uuid>().map_err(|e| {
        warn!("user row {} has a non-uuid id: {e}", row.id);
        PersistenceError("corrupt user id".to_string())
    })?;
    Ok(UserRecord {
        id,
        email: row.email,
        name: row.name,
        password_hash: row.password_hash,
    })
}

impl UserRepo for Database {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, PersistenceError> {
        self.get_user_by_email(email)
            .map_err(|e| store_err("user lookup failed", e))?
            .map(row_to_record)
            .transpose()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, PersistenceError> {
        self.get_user_by_id(&id.to_string())
            .map_err(|e| store_err("user lookup failed", e))?
            .map(row_to_record)
            .transpose()
    }

    fn insert(&self, user: &UserRecord) -> Result<(), UserInsertError> {
        self.create_user(
            &user.id.to_string(),
            &user.email,
            &user.name,
            &user.password_hash,
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                UserInsertError::DuplicateEmail
            } else {
                UserInsertError::Store(store_err("user insert failed", e))
            }
        })
    }

    fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<(), PersistenceError> {
        self.update_user_profile(&id.to_string(), name, email)
            .map_err(|e| store_err("profile update failed", e))
    }

    fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<(), PersistenceError> {
        self.update_user_password(&id.to_string(), hash)
            .map_err(|e| store_err("password update failed", e))
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.delete_user(&id.to_string())
            .map_err(|e| store_err("user delete failed", e))
    }
}

impl QuestionRepo for Database {
    fn replace_active(&self, record: &QuestionRecord) -> Result<(), PersistenceError> {
        self.replace_active_question(
            &record.id.to_string(),
            &record.user_id.to_string(),
            &record.question,
            &record.answer_hash,
            &record.salt,
        )
        .map_err(|e| store_err("question rotation failed", e))
    }

    fn find_active(&self, user_id: Uuid) -> Result<Option<QuestionRecord>, PersistenceError> {
        let row = self
            .get_active_question(&user_id.to_string())
            .map_err(|e| store_err("question lookup failed", e))?;

        let Some(row) = row else { return Ok(None) };
        let id = row.id.parse::<Uuid>().map_err(|e| {
            warn!("question row {} has a non-uuid id: {e}", row.id);
            PersistenceError("corrupt question id".to_string())
        })?;

        Ok(Some(QuestionRecord {
            id,
            user_id,
            question: row.question,
            answer_hash: row.answer_hash,
            salt: row.salt,
        }))
    }

    fn delete_all(&self, user_id: Uuid) -> Result<(), PersistenceError> {
        self.delete_questions(&user_id.to_string())
            .map_err(|e| store_err("question purge failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mira_auth::{CredentialService, RecoveryService, SecurityQuestionVault};
    use mira_auth::error::RegisterError;

    use crate::Database;

    /// End-to-end over the real store: the full register → set
    /// question → recover → delete lifecycle.
    #[test]
    fn auth_core_against_sqlite() {
        let db: Arc<Database> = Arc::new(Database::open_in_memory().unwrap());
        let vault = SecurityQuestionVault::new(db.clone(), db.clone());
        let credentials = CredentialService::new(db.clone(), vault.clone());
        let recovery = RecoveryService::new(db.clone(), vault.clone());

        let alice = credentials
            .register("alice@example.com", "Alice", "secret1")
            .unwrap();
        assert!(credentials.authenticate("alice@example.com", "secret1").is_ok());

        assert_eq!(
            credentials
                .register("alice@example.com", "Again", "secret2")
                .unwrap_err(),
            RegisterError::DuplicateEmail
        );

        vault.set_question(alice.id, "First pet?", "Rex").unwrap();
        let prompt = recovery.request_recovery("alice@example.com").unwrap();
        assert_eq!(prompt.question, "First pet?");
        assert!(recovery.confirm_recovery("alice@example.com", " REX ").is_ok());

        credentials.delete_account(alice.id).unwrap();
        assert!(credentials.authenticate("alice@example.com", "secret1").is_err());
        assert!(vault.active_question(alice.id).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_maps_to_typed_conflict() {
        let db = Database::open_in_memory().unwrap();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            password_hash: "h".to_string(),
        };
        UserRepo::insert(&db, &record).unwrap();

        let again = UserRecord {
            id: Uuid::new_v4(),
            ..record.clone()
        };
        assert_eq!(
            UserRepo::insert(&db, &again).unwrap_err(),
            UserInsertError::DuplicateEmail
        );
    }
}
