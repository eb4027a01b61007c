//! Shop membership repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for the `shop_users` table
#[derive(Debug, Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Finds the active membership of a user in a shop
    pub async fn find_active(
        &self,
        shop_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRow>, DatabaseError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT membership_id, shop_id, user_id, role, is_active, created_at
            FROM shop_users
            WHERE shop_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(shop_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Role as stored in the `shop_role` enum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "shop_role", rename_all = "snake_case")]
pub enum ShopRole {
    Owner,
    Manager,
    Cashier,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRow {
    pub membership_id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Uuid,
    pub role: ShopRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
