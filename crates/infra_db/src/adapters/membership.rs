//! PostgreSQL Membership Adapter
//!
//! Implements `MembershipPort` over the `shop_users` table.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, MembershipId, OperationMetadata, PortError,
    ShopId, UserId,
};
use domain_shop::{Membership, MembershipPort, MembershipRole};

use crate::repositories::membership::{MembershipRepository, MembershipRow, ShopRole};

const ADAPTER_ID: &str = "postgres-membership-adapter";

/// PostgreSQL-backed implementation of the MembershipPort trait
#[derive(Debug, Clone)]
pub struct PostgresMembershipAdapter {
    repository: MembershipRepository,
}

impl PostgresMembershipAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: MembershipRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &MembershipRepository {
        &self.repository
    }
}

impl DomainPort for PostgresMembershipAdapter {}

#[async_trait]
impl HealthCheckable for PostgresMembershipAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), ADAPTER_ID).await
    }
}

#[async_trait]
impl MembershipPort for PostgresMembershipAdapter {
    #[instrument(skip(self, _metadata), fields(shop_id = %shop_id, user_id = %user_id))]
    async fn find_active_membership(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Membership>, PortError> {
        debug!("Looking up shop membership");

        let row = self
            .repository
            .find_active(shop_id.into(), user_id.into())
            .await?;

        Ok(row.map(row_to_membership))
    }
}

fn row_to_membership(row: MembershipRow) -> Membership {
    Membership {
        id: MembershipId::from_uuid(row.membership_id),
        shop_id: ShopId::from_uuid(row.shop_id),
        user_id: UserId::from_uuid(row.user_id),
        role: db_to_domain_role(row.role),
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

fn db_to_domain_role(role: ShopRole) -> MembershipRole {
    match role {
        ShopRole::Owner => MembershipRole::Owner,
        ShopRole::Manager => MembershipRole::Manager,
        ShopRole::Cashier => MembershipRole::Cashier,
    }
}
