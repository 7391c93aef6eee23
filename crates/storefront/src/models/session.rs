//! The signed-in identity kept in the session.

use serde::{Deserialize, Serialize};

use zahra_core::{Email, UserId};

use super::user::User;

/// Who is signed in. Resolves the cart owner for every request, so it stays
/// small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
}

impl CurrentUser {
    /// Session key the identity is stored under.
    pub const SESSION_KEY: &'static str = "current_user";
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
