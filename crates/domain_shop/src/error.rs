//! Access errors

use thiserror::Error;

use core_kernel::{PortError, ShopId, UserId};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Access denied: user {user_id} has no active membership in shop {shop_id}")]
    Denied { shop_id: ShopId, user_id: UserId },

    #[error("Membership lookup failed: {0}")]
    Port(#[from] PortError),
}
