use thiserror::Error;

/// Catastrophic failure inside the hashing primitive (entropy, alloc).
/// Malformed stored hashes are NOT this — verification treats those as
/// a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hashing failure: {0}")]
pub struct HashingError(pub String);

/// The store could not complete an operation. Carries only a message;
/// the driver-level detail stays in the logs of whoever raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store failure: {0}")]
pub struct PersistenceError(pub String);

/// Insert-user outcome. Duplicates are a distinct variant so the
/// UNIQUE-constraint backstop against racing registrations surfaces as
/// a typed conflict rather than a generic store error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserInsertError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Login failure. `InvalidCredentials` covers both "no such user" and
/// "wrong password" — callers must never be able to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordChangeError {
    #[error("unknown user")]
    UnknownUser,
    #[error("current password is incorrect")]
    WrongCurrentPassword,
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("unknown user")]
    UnknownUser,
    #[error("email already in use")]
    EmailTaken,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Recovery failures. `NotFound` and `NoQuestionConfigured` are
/// distinct for the caller's logs but must be presented identically to
/// the end user ("no recovery available for this address").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("unknown email")]
    NotFound,
    #[error("no security question configured")]
    NoQuestionConfigured,
    #[error("answer rejected")]
    AnswerRejected,
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
