//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the shop billing core, built on SQLx, plus the
//! runtime plumbing shared by binaries: settings, tracing setup and service
//! wiring.
//!
//! # Architecture
//!
//! - `repositories`: SQL and row types
//! - `adapters`: implementations of the domain ports over the repositories
//! - `bootstrap`: builds `BillingService` and `CatalogService` on one pool
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{AppSettings, BillingRuntime};
//!
//! let settings = AppSettings::load()?;
//! let runtime = BillingRuntime::connect(&settings).await?;
//! let bill = runtime.billing.create_bill(shop_id, user_id, request).await?;
//! ```

pub mod adapters;
pub mod bootstrap;
pub mod error;
pub mod pool;
pub mod repositories;
pub mod settings;
pub mod telemetry;

pub use bootstrap::BillingRuntime;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabasePool};
pub use settings::{AppSettings, DatabaseSettings};
pub use telemetry::{init_tracing, LogFormat};
