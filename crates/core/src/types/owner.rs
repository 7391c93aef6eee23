//! Cart ownership.
//!
//! A cart belongs either to a signed-in user or to an anonymous visitor
//! identified by a random token kept in a cookie. The two kinds of owner are
//! stored under disjoint key prefixes so a guest token can never collide with
//! a user id.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Random token identifying a guest visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestToken(Uuid);

impl GuestToken {
    /// Mint a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token read back from a cookie.
    ///
    /// Anything that is not a UUID is treated as absent so a tampered cookie
    /// simply starts a new guest cart.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl fmt::Display for GuestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// The identity a cart is keyed by, resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// A signed-in customer.
    Authenticated(UserId),
    /// An anonymous visitor.
    Guest(GuestToken),
}

impl CartOwner {
    /// The storage key for this owner (`user_<id>` or `guest_<token>`).
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Authenticated(id) => format!("user_{id}"),
            Self::Guest(token) => format!("guest_{token}"),
        }
    }

    /// The guest token, if this owner is a guest.
    #[must_use]
    pub const fn guest_token(&self) -> Option<GuestToken> {
        match self {
            Self::Guest(token) => Some(*token),
            Self::Authenticated(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_live_in_disjoint_namespaces() {
        let user = CartOwner::Authenticated(UserId::new(7));
        assert_eq!(user.key(), "user_7");

        let token = GuestToken::parse("0b6f4c1e-2a53-4c1a-9a3f-5d7c9e1b2a40").unwrap();
        let guest = CartOwner::Guest(token);
        assert_eq!(guest.key(), "guest_0b6f4c1e-2a53-4c1a-9a3f-5d7c9e1b2a40");
        assert_ne!(user.key(), guest.key());
    }

    #[test]
    fn tampered_tokens_are_ignored() {
        assert!(GuestToken::parse("'; DROP TABLE cart_items; --").is_none());
        assert!(GuestToken::parse("").is_none());
    }

    #[test]
    fn token_round_trips_through_display() {
        let token = GuestToken::generate();
        assert_eq!(GuestToken::parse(&token.to_string()), Some(token));
    }

    #[test]
    fn only_guests_expose_a_token() {
        assert!(CartOwner::Authenticated(UserId::new(1)).guest_token().is_none());
        let token = GuestToken::generate();
        assert_eq!(CartOwner::Guest(token).guest_token(), Some(token));
    }
}
