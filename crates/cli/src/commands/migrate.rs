//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and then the session store's own
//! migration, which creates `tower_sessions.session`. The server never runs
//! migrations itself.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Schema migration failed: {0}")]
    Schema(#[from] sqlx::migrate::MigrateError),

    #[error("Session table migration failed: {0}")]
    Sessions(#[from] sqlx::Error),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if any migration fails to apply.
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
