//! Narrow storage seams. Each service sees only the records and
//! operations it needs — never an ambient database handle.

use uuid::Uuid;

use crate::error::{PersistenceError, UserInsertError};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// A security question row as the vault sees it. Only the active row
/// per user is ever read back; inactive rows are history.
#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub answer_hash: String,
    pub salt: String,
}

pub trait UserRepo: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, PersistenceError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, PersistenceError>;
    /// Insert a new user. Must report `DuplicateEmail` when the email
    /// is already taken (case-insensitive), including under races —
    /// two concurrent inserts of one email must not both succeed.
    fn insert(&self, user: &UserRecord) -> Result<(), UserInsertError>;
    fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<(), PersistenceError>;
    fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<(), PersistenceError>;
    /// Delete the user row. The store cascades to owned chats and
    /// messages.
    fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;
}

pub trait QuestionRepo: Send + Sync {
    /// Deactivate any active row for `record.user_id` and insert
    /// `record` as the new active row, as one atomic unit. Concurrent
    /// rotations for the same user must leave exactly one active row.
    fn replace_active(&self, record: &QuestionRecord) -> Result<(), PersistenceError>;
    fn find_active(&self, user_id: Uuid) -> Result<Option<QuestionRecord>, PersistenceError>;
    /// Hard-delete every row for the user, active and inactive.
    fn delete_all(&self, user_id: Uuid) -> Result<(), PersistenceError>;
}
