//! Shop Domain Ports
//!
//! The access guard only ever asks one question of the membership store:
//! does this user hold an active membership in this shop? Adapters live in
//! `infra_db` (PostgreSQL) and in [`mock`] for tests.

use async_trait::async_trait;

use core_kernel::{
    DomainPort, HealthCheckable, OperationMetadata, PortError, ShopId, UserId,
};

use crate::membership::Membership;

/// Port for membership lookups
#[async_trait]
pub trait MembershipPort: DomainPort + HealthCheckable {
    /// Returns the active membership of `user_id` in `shop_id`, if any
    async fn find_active_membership(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Membership>, PortError>;
}

/// In-memory membership store for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    use crate::membership::MembershipRole;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryMembershipPort {
        memberships: Arc<RwLock<HashMap<(ShopId, UserId), Membership>>>,
    }

    impl InMemoryMembershipPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Grants `user_id` an active role in `shop_id`
        pub async fn grant(&self, shop_id: ShopId, user_id: UserId, role: MembershipRole) -> Membership {
            let membership = Membership::new(shop_id, user_id, role);
            self.memberships
                .write()
                .await
                .insert((shop_id, user_id), membership.clone());
            membership
        }

        /// Deactivates a membership without removing it
        pub async fn revoke(&self, shop_id: ShopId, user_id: UserId) {
            if let Some(membership) = self.memberships.write().await.get_mut(&(shop_id, user_id)) {
                membership.is_active = false;
            }
        }
    }

    impl DomainPort for InMemoryMembershipPort {}

    #[async_trait]
    impl HealthCheckable for InMemoryMembershipPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-memberships", 0)
                .with_message("In-memory adapter always healthy")
        }
    }

    #[async_trait]
    impl MembershipPort for InMemoryMembershipPort {
        async fn find_active_membership(
            &self,
            shop_id: ShopId,
            user_id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Membership>, PortError> {
            Ok(self
                .memberships
                .read()
                .await
                .get(&(shop_id, user_id))
                .filter(|m| m.grants(shop_id))
                .cloned())
        }
    }
}
