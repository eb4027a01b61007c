//! Billing Domain - Bills, Payments and the Bill Ledger
//!
//! This crate implements the billing core of a multi-tenant shop system:
//! bill creation and editing, payment application, balance and status
//! derivation, and bill-number allocation.
//!
//! # Ledger
//!
//! Every bill carries materialized ledger fields that are recomputed
//! inside a store transaction whenever lines or payments change:
//!
//! - `total = max(0, subtotal + tax - discount)`
//! - `balance = total - paid` (signed; overpayment goes negative)
//! - status after a payment: `Paid` when settled, else `Overdue` past the
//!   due date, else `Sent`
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, BillRequest, PaymentRequest, PaymentMethod};
//!
//! let bill = service.create_bill(shop_id, user_id, request).await?;
//! let receipt = service
//!     .add_payment(bill.id, shop_id, user_id, PaymentRequest {
//!         amount: bill.balance.amount(),
//!         payment_date: "2024-05-20".into(),
//!         payment_method: PaymentMethod::Cash,
//!         reference: None,
//!         notes: None,
//!     })
//!     .await?;
//! assert!(receipt.ledger.balance.is_zero());
//! ```

pub mod bill;
pub mod payment;
pub mod ledger;
pub mod numbering;
pub mod request;
pub mod ports;
pub mod settings;
pub mod service;
pub mod lifecycle;
pub mod recorder;
pub mod stats;
pub mod error;

pub use bill::{Bill, BillLine, BillStatus};
pub use payment::{Payment, PaymentMethod};
pub use ledger::{compute_totals, apply_payment, derive_status, rebalance, Totals, LedgerUpdate};
pub use numbering::{BillNumberAllocator, format_bill_number};
pub use request::{BillRequest, BillLineRequest, PaymentRequest, BillFilter};
pub use ports::{BillingStore, BillingTransaction, BillSummary};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InMemoryBillingStore, FailurePoint};
pub use settings::BillingSettings;
pub use service::BillingService;
pub use recorder::PaymentReceipt;
pub use stats::BillStats;
pub use error::BillingError;
