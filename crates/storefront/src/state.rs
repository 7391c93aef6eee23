//! Application state shared across handlers.

use std::sync::Arc;

use zahra_core::ShippingPolicy;

use crate::config::StorefrontConfig;
use crate::db::PgStore;
use crate::services::uploads::UploadStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration. The store type is a
/// parameter so tests can run the full router over an in-memory store.
pub struct AppState<S = PgStore> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    config: StorefrontConfig,
    store: S,
    uploads: UploadStorage,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Persistence backend
    #[must_use]
    pub fn new(config: StorefrontConfig, store: S) -> Self {
        let uploads = UploadStorage::new(config.upload_dir.clone(), config.max_upload_bytes);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                uploads,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to the upload storage.
    #[must_use]
    pub fn uploads(&self) -> &UploadStorage {
        &self.inner.uploads
    }

    /// The shipping policy applied at checkout.
    #[must_use]
    pub fn shipping(&self) -> ShippingPolicy {
        self.inner.config.shipping
    }
}
