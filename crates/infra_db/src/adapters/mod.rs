//! Domain Adapters
//!
//! Adapter implementations for the domain ports, connecting them to the
//! PostgreSQL repositories.
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Maps `DatabaseError` into `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingStore;
//! use domain_billing::BillingStore;
//!
//! let store = PostgresBillingStore::new(pool);
//! let bill = store.load_bill(shop_id, bill_id).await?;
//! ```

pub mod billing;
pub mod catalog;
pub mod membership;

pub use billing::{PostgresBillingStore, PostgresBillingTransaction};
pub use catalog::PostgresCatalogAdapter;
pub use membership::PostgresMembershipAdapter;

use std::time::Instant;

use core_kernel::{Currency, HealthCheckResult, PortError};
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Runs `SELECT 1` against the pool and reports the round trip
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}

/// Parses a stored currency code
pub(crate) fn parse_currency(code: &str) -> Result<Currency, PortError> {
    code.parse::<Currency>()
        .map_err(|e| DatabaseError::SerializationError(e.to_string()).into())
}
