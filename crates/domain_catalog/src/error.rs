//! Catalog errors

use thiserror::Error;

use core_kernel::{ItemId, PortError, ShopId, UserId};
use domain_shop::AccessError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Access denied: user {user_id} has no active membership in shop {shop_id}")]
    AccessDenied { shop_id: ShopId, user_id: UserId },

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Invalid customer: {0}")]
    InvalidCustomer(String),

    #[error("Catalog store error: {0}")]
    Store(#[from] PortError),
}

impl From<AccessError> for CatalogError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied { shop_id, user_id } => CatalogError::AccessDenied { shop_id, user_id },
            AccessError::Port(port) => CatalogError::Store(port),
        }
    }
}
