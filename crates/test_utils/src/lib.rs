//! Test Utilities Crate
//!
//! Shared test infrastructure for the shop billing suites.
//!
//! # Modules
//!
//! - `fixtures`: a ready-made shop (`BillingWorld`) on in-memory adapters
//! - `builders`: builders for bill, payment, item and customer requests
//! - `database`: PostgreSQL test containers with migrations applied
//! - `assertions`: ledger and money assertions
//! - `generators`: property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
