//! Credential verification and security-question account recovery.
//!
//! This crate is the trust core: password hashing, the single-active
//! security question vault, login/registration, and the recovery flow.
//! It talks to storage only through the narrow repository traits in
//! [`repo`] and knows nothing about HTTP or SQL.

pub mod credentials;
pub mod error;
pub mod hash;
pub mod recovery;
pub mod repo;
pub mod vault;

pub use credentials::{CredentialService, UserIdentity};
pub use recovery::{RecoveryPrompt, RecoveryService};
pub use vault::SecurityQuestionVault;

/// Canonical email form used for every lookup and store: trimmed,
/// lowercased. Uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
pub(crate) mod testutil;
