//! Security-question account recovery. Discloses as little as it can:
//! the recovery prompt masks the email and name, and every failure the
//! end user sees is the same regardless of why it failed.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::RecoveryError;
use crate::normalize_email;
use crate::repo::UserRepo;
use crate::vault::SecurityQuestionVault;
use crate::UserIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPrompt {
    pub question: String,
    pub masked_email: String,
    pub masked_name: String,
}

#[derive(Clone)]
pub struct RecoveryService {
    users: Arc<dyn UserRepo>,
    vault: SecurityQuestionVault,
}

impl RecoveryService {
    pub fn new(users: Arc<dyn UserRepo>, vault: SecurityQuestionVault) -> Self {
        Self { users, vault }
    }

    /// Look up the recovery prompt for an email. `NotFound` and
    /// `NoQuestionConfigured` are distinct here for logging; the HTTP
    /// layer presents both as the same "no recovery available" answer.
    pub fn request_recovery(&self, email: &str) -> Result<RecoveryPrompt, RecoveryError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email)? else {
            debug!("recovery requested for unknown email");
            return Err(RecoveryError::NotFound);
        };

        let Some(question) = self.vault.active_question(user.id)? else {
            debug!(user_id = %user.id, "recovery requested but no question configured");
            return Err(RecoveryError::NoQuestionConfigured);
        };

        Ok(RecoveryPrompt {
            question,
            masked_email: mask_email(&user.email),
            masked_name: mask_name(&user.name),
        })
    }

    /// Check the answer. On success returns the identity so the caller
    /// can mint a session; any failure is one uniform `AnswerRejected`.
    pub fn confirm_recovery(
        &self,
        email: &str,
        answer: &str,
    ) -> Result<UserIdentity, RecoveryError> {
        let email = normalize_email(email);

        if !self.vault.verify_answer_by_email(&email, answer)? {
            debug!("recovery answer rejected");
            return Err(RecoveryError::AnswerRejected);
        }

        // verify_answer_by_email succeeded, so the user exists
        let user = self
            .users
            .find_by_email(&email)?
            .ok_or(RecoveryError::AnswerRejected)?;

        info!(user_id = %user.id, "recovery confirmed");
        Ok(user.into())
    }
}

/// `alice@example.com` -> `a***@example.com`. Keeps the first character
/// of the local part and the full domain.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let head: String = local.chars().take(1).collect();
            format!("{head}***@{domain}")
        }
        None => {
            let head: String = email.chars().take(1).collect();
            format!("{head}***")
        }
    }
}

/// `Alice` -> `A***`.
fn mask_name(name: &str) -> String {
    let head: String = name.chars().take(1).collect();
    format!("{head}***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;

    fn setup() -> (RecoveryService, SecurityQuestionVault, uuid::Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.seed_user("alice@example.com", "Alice", "irrelevant");
        let vault = SecurityQuestionVault::new(store.clone(), store.clone());
        let svc = RecoveryService::new(store, vault.clone());
        (svc, vault, user_id)
    }

    #[test]
    fn full_recovery_scenario() {
        let (svc, vault, user) = setup();
        vault.set_question(user, "First pet?", "Rex").unwrap();

        let prompt = svc.request_recovery("alice@example.com").unwrap();
        assert_eq!(prompt.question, "First pet?");
        assert_eq!(prompt.masked_email, "a***@example.com");
        assert_eq!(prompt.masked_name, "A***");

        let identity = svc.confirm_recovery("alice@example.com", "rex").unwrap();
        assert_eq!(identity.id, user);

        assert_eq!(
            svc.confirm_recovery("alice@example.com", "fido").unwrap_err(),
            RecoveryError::AnswerRejected
        );
    }

    #[test]
    fn unknown_email_and_missing_question_are_distinct_to_the_caller() {
        let (svc, _vault, _user) = setup();

        // alice exists but never set a question
        assert_eq!(
            svc.request_recovery("alice@example.com").unwrap_err(),
            RecoveryError::NoQuestionConfigured
        );
        assert_eq!(
            svc.request_recovery("nobody@example.com").unwrap_err(),
            RecoveryError::NotFound
        );
    }

    #[test]
    fn confirm_never_leaks_whether_the_email_exists() {
        let (svc, vault, user) = setup();
        vault.set_question(user, "First pet?", "Rex").unwrap();

        let unknown = svc.confirm_recovery("nobody@example.com", "rex").unwrap_err();
        let wrong = svc.confirm_recovery("alice@example.com", "fido").unwrap_err();
        assert_eq!(unknown, wrong);
    }

    #[test]
    fn masking() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("x@y.z"), "x***@y.z");
        assert_eq!(mask_email("not-an-email"), "n***");
        assert_eq!(mask_name("Alice"), "A***");
        assert_eq!(mask_name(""), "***");
    }
}
