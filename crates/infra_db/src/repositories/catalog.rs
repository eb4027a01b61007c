//! Catalog repository implementation
//!
//! SQL for the shop's items and customers. Billing reads items and
//! customers, and adjusts stock, inside its own transaction through the
//! connection-level functions here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for items and customers
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts every item in one transaction
    pub async fn insert_items(&self, items: &[ItemRow]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO items (
                    item_id, shop_id, name, description, sku, price, cost_price, currency,
                    tax_rate, category, quantity, min_quantity, unit, is_active,
                    created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.item_id)
            .bind(item.shop_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.sku)
            .bind(item.price)
            .bind(item.cost_price)
            .bind(&item.currency)
            .bind(item.tax_rate)
            .bind(&item.category)
            .bind(item.quantity)
            .bind(item.min_quantity)
            .bind(&item.unit)
            .bind(item.is_active)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetches a non-deleted item of the shop
    pub async fn find_item(
        conn: &mut PgConnection,
        shop_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<ItemRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_id, shop_id, name, description, sku, price, cost_price, currency,
                   tax_rate, category, quantity, min_quantity, unit, is_active,
                   created_at, updated_at
            FROM items
            WHERE item_id = $1 AND shop_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(item_id)
        .bind(shop_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// Adds `delta` to an item's stock quantity
    pub async fn adjust_quantity(
        conn: &mut PgConnection,
        shop_id: Uuid,
        item_id: Uuid,
        delta: Decimal,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET quantity = quantity + $3, updated_at = now()
            WHERE item_id = $1 AND shop_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(item_id)
        .bind(shop_id)
        .bind(delta)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Item", item_id));
        }
        Ok(())
    }

    pub async fn insert_customer(&self, customer: &CustomerRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO customers (
                customer_id, shop_id, name, email, phone, address, city, state, country,
                postal_code, tax_number, notes, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(customer.customer_id)
        .bind(customer.shop_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(&customer.country)
        .bind(&customer.postal_code)
        .bind(&customer.tax_number)
        .bind(&customer.notes)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a customer of the shop
    ///
    /// With `include_deleted` a soft-deleted customer is still returned,
    /// which bill hydration relies on.
    pub async fn find_customer(
        conn: &mut PgConnection,
        shop_id: Uuid,
        customer_id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<CustomerRow>, DatabaseError> {
        let mut sql = String::from(
            r#"
            SELECT customer_id, shop_id, name, email, phone, address, city, state, country,
                   postal_code, tax_number, notes, is_active, created_at, updated_at
            FROM customers
            WHERE customer_id = $1 AND shop_id = $2
            "#,
        );
        if !include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(customer_id)
            .bind(shop_id)
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }
}

// ============================================================================
// Database row types
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub item_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub currency: String,
    pub tax_rate: Decimal,
    pub category: Option<String>,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub tax_number: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
