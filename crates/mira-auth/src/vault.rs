//! Per-user security question store. At most one row per user is
//! active at any time; rotation keeps old rows as inactive history.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{PersistenceError, VaultError};
use crate::hash;
use crate::normalize_email;
use crate::repo::{QuestionRecord, QuestionRepo, UserRepo};

/// Answers are matched case- and whitespace-insensitively: normalize
/// before hashing and before verifying, identically.
fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[derive(Clone)]
pub struct SecurityQuestionVault {
    users: Arc<dyn UserRepo>,
    questions: Arc<dyn QuestionRepo>,
}

impl SecurityQuestionVault {
    pub fn new(users: Arc<dyn UserRepo>, questions: Arc<dyn QuestionRepo>) -> Self {
        Self { users, questions }
    }

    /// Set or rotate the user's security question. The deactivate-and-
    /// insert pair is one atomic unit in the repo; a fresh 256-bit salt
    /// is generated per rotation.
    pub fn set_question(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<(), VaultError> {
        let salt = hash::generate_salt();
        let answer_hash = hash::hash_with_salt(&normalize_answer(answer), &salt)?;

        self.questions.replace_active(&QuestionRecord {
            id: Uuid::new_v4(),
            user_id,
            question: question.to_string(),
            answer_hash,
            salt,
        })?;

        debug!(%user_id, "security question rotated");
        Ok(())
    }

    pub fn active_question(&self, user_id: Uuid) -> Result<Option<String>, PersistenceError> {
        Ok(self.questions.find_active(user_id)?.map(|r| r.question))
    }

    /// Email-keyed lookup. Returns `None` both when the email is
    /// unknown and when the account has no active question — callers
    /// must not let the two cases diverge in anything user-visible.
    pub fn active_question_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(String, Uuid)>, PersistenceError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email))? else {
            return Ok(None);
        };
        Ok(self
            .questions
            .find_active(user.id)?
            .map(|r| (r.question, user.id)))
    }

    /// Check an answer against the active question. `false` when no
    /// question is set — never an error.
    pub fn verify_answer(&self, user_id: Uuid, answer: &str) -> Result<bool, PersistenceError> {
        let Some(record) = self.questions.find_active(user_id)? else {
            return Ok(false);
        };
        Ok(hash::verify_secret(
            &normalize_answer(answer),
            &record.answer_hash,
        ))
    }

    pub fn verify_answer_by_email(
        &self,
        email: &str,
        answer: &str,
    ) -> Result<bool, PersistenceError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email))? else {
            return Ok(false);
        };
        self.verify_answer(user.id, answer)
    }

    /// Purge every row for the user. Account deletion only.
    pub fn remove_all(&self, user_id: Uuid) -> Result<(), PersistenceError> {
        self.questions.delete_all(user_id)
    }
}
