//! Cart owner resolution.
//!
//! Every cart request is keyed by a [`CartOwner`], resolved once per request:
//! the signed-in user if there is one, otherwise the guest token from the
//! `guest_session` cookie, otherwise a freshly minted guest token.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use zahra_core::{CartOwner, GuestToken};

use super::auth::OptionalAuth;
use crate::db::Store;
use crate::state::AppState;

/// Guest cart cookie name.
pub const GUEST_COOKIE_NAME: &str = "guest_session";

/// Guest cookie lifetime in days.
const GUEST_COOKIE_DAYS: i64 = 30;

/// The cart owner for this request, plus whatever is needed to keep a guest
/// recognisable on the next one.
#[derive(Debug, Clone, Copy)]
pub struct ShopperIdentity {
    pub owner: CartOwner,
    secure: bool,
}

impl ShopperIdentity {
    /// The `Set-Cookie` header to attach for guests.
    ///
    /// Sent on every guest response so the 30-day window slides with activity.
    #[must_use]
    pub fn guest_cookie(&self) -> Option<(header::HeaderName, HeaderValue)> {
        let token = self.owner.guest_token()?;
        let cookie = Cookie::build((GUEST_COOKIE_NAME, token.to_string()))
            .path("/")
            .max_age(Duration::days(GUEST_COOKIE_DAYS))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure)
            .build();
        HeaderValue::from_str(&cookie.to_string())
            .ok()
            .map(|value| (header::SET_COOKIE, value))
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for ShopperIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let secure = state.config().is_secure();
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));

        let owner = match user {
            Some(user) => CartOwner::Authenticated(user.id),
            None => CartOwner::Guest(
                guest_token_from_cookies(parts).unwrap_or_else(GuestToken::generate),
            ),
        };
        tracing::Span::current().record("cart_owner", tracing::field::display(owner.key()));

        Ok(Self { owner, secure })
    }
}

/// The guest token from any `Cookie` header, if present and well formed.
fn guest_token_from_cookies(parts: &Parts) -> Option<GuestToken> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == GUEST_COOKIE_NAME)
        .and_then(|cookie| GuestToken::parse(cookie.value()))
}
