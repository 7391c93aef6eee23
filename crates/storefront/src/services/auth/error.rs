//! Account errors.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] zahra_core::EmailError),

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    /// Password outside the accepted length range.
    #[error("{0}")]
    InvalidPassword(String),

    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// argon2 failed to produce a hash.
    #[error("password hashing failed")]
    Hashing,
}
