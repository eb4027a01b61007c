//! Wiring of the domain services onto PostgreSQL adapters

use std::sync::Arc;

use core_kernel::{HealthCheckResult, HealthCheckable};
use domain_billing::BillingService;
use domain_catalog::CatalogService;
use domain_shop::AccessGuard;

use crate::adapters::{PostgresBillingStore, PostgresCatalogAdapter, PostgresMembershipAdapter};
use crate::pool::{create_pool, DatabasePool};
use crate::settings::AppSettings;
use crate::error::DatabaseError;

/// Services and adapters sharing one connection pool
#[derive(Clone)]
pub struct BillingRuntime {
    pub pool: DatabasePool,
    pub billing: BillingService,
    pub catalog: CatalogService,
    memberships: Arc<PostgresMembershipAdapter>,
    catalog_adapter: Arc<PostgresCatalogAdapter>,
    store: Arc<PostgresBillingStore>,
}

impl BillingRuntime {
    /// Connects the pool described by `settings` and builds the services
    pub async fn connect(settings: &AppSettings) -> Result<Self, DatabaseError> {
        let pool = create_pool(&settings.database).await?;
        Ok(Self::from_pool(pool, settings))
    }

    pub fn from_pool(pool: DatabasePool, settings: &AppSettings) -> Self {
        let memberships = Arc::new(PostgresMembershipAdapter::new(pool.clone()));
        let catalog_adapter = Arc::new(PostgresCatalogAdapter::new(pool.clone()));
        let store = Arc::new(PostgresBillingStore::new(pool.clone()));
        let guard = AccessGuard::new(memberships.clone());

        let billing = BillingService::new(store.clone(), guard.clone(), settings.billing.clone());
        let catalog = CatalogService::new(
            catalog_adapter.clone(),
            guard,
            settings.billing.currency,
        );

        Self {
            pool,
            billing,
            catalog,
            memberships,
            catalog_adapter,
            store,
        }
    }

    /// Runs every adapter's health check
    pub async fn health(&self) -> Vec<HealthCheckResult> {
        vec![
            self.memberships.health_check().await,
            self.catalog_adapter.health_check().await,
            self.store.health_check().await,
        ]
    }
}
