//! Billing domain errors

use thiserror::Error;

use core_kernel::{BillId, CustomerId, ItemId, MoneyError, PortError, ShopId, TemporalError, UserId};
use domain_shop::AccessError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Caller has no active membership in the shop
    #[error("Access denied: user {user_id} has no active membership in shop {shop_id}")]
    AccessDenied { shop_id: ShopId, user_id: UserId },

    /// Bill absent, soft-deleted, or owned by another shop
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// A line references an item outside the shop's catalog
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// A date did not parse as YYYY-MM-DD
    #[error("Invalid {field}: '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { field: String, value: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the bill's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No free bill number was found within the attempt budget
    #[error("Bill number allocation exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("Calculation error: {0}")]
    Money(#[from] MoneyError),

    /// Persistence failure, propagated unchanged
    #[error("Billing store error: {0}")]
    Store(#[from] PortError),
}

impl BillingError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        BillingError::InvalidInput(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        BillingError::InvalidState(message.into())
    }

    /// Returns true if a unique-constraint conflict caused this error
    pub fn is_conflict(&self) -> bool {
        matches!(self, BillingError::Store(port) if port.is_conflict())
    }
}

impl From<AccessError> for BillingError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied { shop_id, user_id } => BillingError::AccessDenied { shop_id, user_id },
            AccessError::Port(port) => BillingError::Store(port),
        }
    }
}

impl From<TemporalError> for BillingError {
    fn from(err: TemporalError) -> Self {
        match err {
            TemporalError::InvalidDate { field, value } => BillingError::InvalidDate { field, value },
        }
    }
}
