//! Registration, login, and the account-mutating operations.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{
    AuthError, PasswordChangeError, PersistenceError, ProfileError, RegisterError,
    UserInsertError,
};
use crate::hash;
use crate::normalize_email;
use crate::repo::{UserRecord, UserRepo};
use crate::vault::SecurityQuestionVault;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Public identity handed back to callers. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<UserRecord> for UserIdentity {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
        }
    }
}

#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepo>,
    vault: SecurityQuestionVault,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepo>, vault: SecurityQuestionVault) -> Self {
        Self { users, vault }
    }

    pub fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserIdentity, RegisterError> {
        let email = normalize_email(email);

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegisterError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if self.users.find_by_email(&email)?.is_some() {
            return Err(RegisterError::DuplicateEmail);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email,
            name: name.trim().to_string(),
            password_hash: hash::hash_secret(password)?,
        };

        // The UNIQUE constraint is the backstop for racing registrations.
        self.users.insert(&record).map_err(|e| match e {
            UserInsertError::DuplicateEmail => RegisterError::DuplicateEmail,
            UserInsertError::Store(e) => RegisterError::Persistence(e),
        })?;

        info!(user_id = %record.id, "user registered");
        Ok(record.into())
    }

    /// Verify an email/password pair. Unknown email and wrong password
    /// collapse into one `InvalidCredentials`; only the logs know which.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email)? else {
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !hash::verify_secret(password, &user.password_hash) {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user.into())
    }

    /// The only path besides registration that writes the password
    /// field. Verifies the current password before accepting the new one.
    pub fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), PasswordChangeError> {
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(PasswordChangeError::UnknownUser)?;

        if !hash::verify_secret(current_password, &user.password_hash) {
            return Err(PasswordChangeError::WrongCurrentPassword);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PasswordChangeError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let new_hash = hash::hash_secret(new_password)?;
        self.users.update_password_hash(user_id, &new_hash)?;
        info!(%user_id, "password changed");
        Ok(())
    }

    pub fn update_profile(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<UserIdentity, ProfileError> {
        let email = normalize_email(email);

        self.users
            .find_by_id(user_id)?
            .ok_or(ProfileError::UnknownUser)?;

        // Taken only when a DIFFERENT user owns it; keeping your own
        // email while renaming is fine.
        if let Some(owner) = self.users.find_by_email(&email)? {
            if owner.id != user_id {
                return Err(ProfileError::EmailTaken);
            }
        }

        let name = name.trim().to_string();
        self.users.update_profile(user_id, &name, &email)?;
        Ok(UserIdentity {
            id: user_id,
            email,
            name,
        })
    }

    /// Delete the account. Security questions are purged explicitly
    /// before the user row goes away; chats and messages ride the
    /// store's cascade.
    pub fn delete_account(&self, user_id: Uuid) -> Result<(), PersistenceError> {
        self.vault.remove_all(user_id)?;
        self.users.delete(user_id)?;
        info!(%user_id, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;

    fn service() -> (CredentialService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let vault = SecurityQuestionVault::new(store.clone(), store.clone());
        (CredentialService::new(store.clone(), vault), store)
    }

    #[test]
    fn register_then_authenticate() {
        let (svc, _) = service();
        let created = svc
            .register("alice@example.com", "Alice", "secret1")
            .unwrap();

        let authed = svc.authenticate("alice@example.com", "secret1").unwrap();
        assert_eq!(authed.id, created.id);
        assert_eq!(authed.email, "alice@example.com");

        let err = svc
            .authenticate("alice@example.com", "secret2")
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn unknown_email_and_wrong_password_are_indistinguishable() {
        let (svc, _) = service();
        svc.register("real@x.com", "Real", "secret1").unwrap();

        let unknown = svc.authenticate("nobody@x.com", "anything").unwrap_err();
        let wrong = svc.authenticate("real@x.com", "wrongpassword").unwrap_err();
        assert_eq!(unknown, wrong);
    }

    #[test]
    fn duplicate_email_rejected_case_insensitively() {
        let (svc, store) = service();
        svc.register("alice@example.com", "Alice", "secret1").unwrap();

        let err = svc
            .register("Alice@Example.COM", "Imposter", "secret2")
            .unwrap_err();
        assert_eq!(err, RegisterError::DuplicateEmail);
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn short_password_rejected_at_registration() {
        let (svc, store) = service();
        let err = svc.register("a@b.com", "A", "12345").unwrap_err();
        assert_eq!(err, RegisterError::WeakPassword(MIN_PASSWORD_LEN));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn email_is_normalized_on_registration() {
        let (svc, _) = service();
        svc.register("  Alice@Example.Com ", "Alice", "secret1")
            .unwrap();
        assert!(svc.authenticate("alice@example.com", "secret1").is_ok());
    }

    #[test]
    fn change_password_requires_current_password() {
        let (svc, _) = service();
        let user = svc.register("a@b.com", "A", "secret1").unwrap();

        let err = svc
            .change_password(user.id, "nope", "newsecret")
            .unwrap_err();
        assert_eq!(err, PasswordChangeError::WrongCurrentPassword);

        // old password still works
        assert!(svc.authenticate("a@b.com", "secret1").is_ok());
    }

    #[test]
    fn weak_new_password_leaves_hash_unchanged() {
        let (svc, store) = service();
        let user = svc.register("a@b.com", "A", "secret1").unwrap();
        let before = store.password_hash_of(user.id);

        let err = svc.change_password(user.id, "secret1", "12345").unwrap_err();
        assert_eq!(err, PasswordChangeError::WeakPassword(MIN_PASSWORD_LEN));
        assert_eq!(store.password_hash_of(user.id), before);
        assert!(svc.authenticate("a@b.com", "secret1").is_ok());
    }

    #[test]
    fn change_password_switches_accepted_secret() {
        let (svc, _) = service();
        let user = svc.register("a@b.com", "A", "secret1").unwrap();

        svc.change_password(user.id, "secret1", "secret2").unwrap();
        assert!(svc.authenticate("a@b.com", "secret2").is_ok());
        assert_eq!(
            svc.authenticate("a@b.com", "secret1").unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn profile_update_rejects_email_owned_by_another_user() {
        let (svc, _) = service();
        let alice = svc.register("alice@x.com", "Alice", "secret1").unwrap();
        svc.register("bob@x.com", "Bob", "secret1").unwrap();

        let err = svc
            .update_profile(alice.id, "Alice", "bob@x.com")
            .unwrap_err();
        assert_eq!(err, ProfileError::EmailTaken);

        // keeping her own email is not a conflict
        let updated = svc
            .update_profile(alice.id, "Alice B.", "alice@x.com")
            .unwrap();
        assert_eq!(updated.name, "Alice B.");
    }

    #[test]
    fn deleted_account_cannot_authenticate_and_has_no_question() {
        let (svc, store) = service();
        let alice = svc.register("alice@example.com", "Alice", "secret1").unwrap();
        let vault = SecurityQuestionVault::new(store.clone(), store.clone());
        vault.set_question(alice.id, "First pet?", "Rex").unwrap();

        svc.delete_account(alice.id).unwrap();

        assert_eq!(
            svc.authenticate("alice@example.com", "secret1").unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert!(vault.active_question(alice.id).unwrap().is_none());
    }
}
