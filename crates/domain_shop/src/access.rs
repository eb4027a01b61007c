//! Access Guard
//!
//! Gate in front of every shop-scoped operation.

use std::sync::Arc;
use tracing::{debug, warn};

use core_kernel::{OperationMetadata, ShopId, UserId};

use crate::error::AccessError;
use crate::membership::Membership;
use crate::ports::MembershipPort;

/// Verifies that a principal holds an active membership in a shop
#[derive(Clone)]
pub struct AccessGuard {
    memberships: Arc<dyn MembershipPort>,
}

impl AccessGuard {
    pub fn new(memberships: Arc<dyn MembershipPort>) -> Self {
        Self { memberships }
    }

    /// Returns the active membership, or `AccessError::Denied`
    ///
    /// Read-only. Lookup failures surface as `AccessError::Port` rather than
    /// a denial so callers can tell an outage from a missing grant.
    pub async fn check_access(
        &self,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<Membership, AccessError> {
        let metadata = OperationMetadata::default().initiated_by(user_id);
        match self
            .memberships
            .find_active_membership(shop_id, user_id, Some(metadata))
            .await?
        {
            Some(membership) => {
                debug!(%shop_id, %user_id, role = %membership.role, "access granted");
                Ok(membership)
            }
            None => {
                warn!(%shop_id, %user_id, "access denied");
                Err(AccessError::Denied { shop_id, user_id })
            }
        }
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard").finish_non_exhaustive()
    }
}
