//! Account handlers.
//!
//! Password registration and login. On success the session holds a
//! [`CurrentUser`], which also switches cart ownership from the guest token
//! to the account.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::Store;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login and registration body.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// `POST /auth/register`
#[instrument(skip(state, session, body))]
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    body: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(credentials) = body?;
    let user = AuthService::new(state.store())
        .register_with_password(&credentials.email, &credentials.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(AuthError::from)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `POST /auth/login`
#[instrument(skip(state, session, body))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    body: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(credentials) = body?;
    let user = AuthService::new(state.store())
        .login_with_password(&credentials.email, &credentials.password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!("Failed login attempt");
            }
        })?;

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(AuthError::from)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `POST /auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session)
        .await
        .map_err(AuthError::from)?;
    clear_sentry_user();
    Ok(Json(json!({ "success": true })))
}

/// `GET /auth/me`
pub async fn me(RequireAuth(user): RequireAuth) -> Json<Value> {
    Json(json!({ "user": user }))
}
