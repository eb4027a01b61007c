//! Core Kernel - Foundational types shared by the billing crates
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Calendar parsing and an injectable clock
//! - Strongly-typed identifiers
//! - The port error model used by every adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{
    Clock, SystemClock, FixedClock, TemporalError,
    parse_calendar_date, parse_optional_date, first_day_of_month,
};
pub use identifiers::{
    ShopId, UserId, MembershipId, ItemId, CustomerId,
    BillId, BillLineId, PaymentId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
    OperationMetadata,
};
