//! Repository implementations for shop billing data
//!
//! Repositories encapsulate SQL and map between database rows and plain
//! row structs; conversion to domain types happens in `crate::adapters`.
//!
//! # Architecture
//!
//! - Runtime-checked queries (`sqlx::query_as` with `FromRow` rows)
//! - Connection-level functions so statements can join a caller's transaction
//! - PostgreSQL enum types mirrored as `sqlx::Type` enums

pub mod billing;
pub mod catalog;
pub mod membership;

pub use billing::BillingRepository;
pub use catalog::CatalogRepository;
pub use membership::MembershipRepository;
