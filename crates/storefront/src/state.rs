//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{
    EmailLookup, IdentityResolver, NotificationDispatcher, NotificationError, OrderService,
    SchoolDirectory,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    orders: OrderService,
    schools: SchoolDirectory,
    identity: Arc<dyn IdentityResolver>,
    notifications: NotificationDispatcher,
}

impl AppState {
    /// Build state from configuration, wiring the SMTP transport when mail
    /// settings are present.
    ///
    /// # Errors
    ///
    /// Returns an error if the mail settings are invalid.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, NotificationError> {
        let notifications = NotificationDispatcher::from_config(&config)?;
        Ok(Self::with_dispatcher(config, pool, notifications))
    }

    /// Build state around an existing dispatcher.
    #[must_use]
    pub fn with_dispatcher(
        config: StorefrontConfig,
        pool: PgPool,
        notifications: NotificationDispatcher,
    ) -> Self {
        let orders = OrderService::new(pool.clone(), config.db_timeout);
        let schools = SchoolDirectory::new(pool.clone());
        let identity = Arc::new(EmailLookup::new(pool.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
                schools,
                identity,
                notifications,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn schools(&self) -> &SchoolDirectory {
        &self.inner.schools
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityResolver {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationDispatcher {
        &self.inner.notifications
    }
}
