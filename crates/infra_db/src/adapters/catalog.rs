//! PostgreSQL Catalog Adapter
//!
//! Implements `CatalogPort` over the `items` and `customers` tables. The
//! row conversions here are shared with the billing adapter, which reads
//! items and customers inside its transactions.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use core_kernel::{
    CustomerId, DomainPort, HealthCheckResult, HealthCheckable, ItemId, Money, OperationMetadata,
    PortError, ShopId,
};
use domain_catalog::{CatalogPort, Customer, Item};

use super::parse_currency;
use crate::repositories::catalog::{CatalogRepository, CustomerRow, ItemRow};

const ADAPTER_ID: &str = "postgres-catalog-adapter";

/// PostgreSQL-backed implementation of the CatalogPort trait
#[derive(Debug, Clone)]
pub struct PostgresCatalogAdapter {
    repository: CatalogRepository,
}

impl PostgresCatalogAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CatalogRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &CatalogRepository {
        &self.repository
    }
}

impl DomainPort for PostgresCatalogAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCatalogAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), ADAPTER_ID).await
    }
}

#[async_trait]
impl CatalogPort for PostgresCatalogAdapter {
    #[instrument(skip(self, items, _metadata), fields(count = items.len()))]
    async fn insert_items(
        &self,
        items: Vec<Item>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Item>, PortError> {
        let rows: Vec<ItemRow> = items.iter().map(item_to_row).collect();
        self.repository.insert_items(&rows).await?;

        info!(count = items.len(), "Items inserted");
        Ok(items)
    }

    #[instrument(skip(self, _metadata), fields(item_id = %item_id))]
    async fn get_item(
        &self,
        shop_id: ShopId,
        item_id: ItemId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Item>, PortError> {
        debug!("Fetching item");

        let mut conn = self
            .repository
            .pool()
            .acquire()
            .await
            .map_err(crate::DatabaseError::from)?;
        let row = CatalogRepository::find_item(&mut conn, shop_id.into(), item_id.into()).await?;

        row.map(row_to_item).transpose()
    }

    #[instrument(skip(self, customer, _metadata), fields(customer_id = %customer.id))]
    async fn insert_customer(
        &self,
        customer: Customer,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Customer, PortError> {
        self.repository.insert_customer(&customer_to_row(&customer)).await?;
        Ok(customer)
    }

    #[instrument(skip(self, _metadata), fields(customer_id = %customer_id))]
    async fn get_customer(
        &self,
        shop_id: ShopId,
        customer_id: CustomerId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Customer>, PortError> {
        debug!("Fetching customer");

        let mut conn = self
            .repository
            .pool()
            .acquire()
            .await
            .map_err(crate::DatabaseError::from)?;
        let row = CatalogRepository::find_customer(
            &mut conn,
            shop_id.into(),
            customer_id.into(),
            false,
        )
        .await?;

        Ok(row.map(row_to_customer))
    }
}

// ============================================================================
// Row conversions
// ============================================================================

pub(crate) fn row_to_item(row: ItemRow) -> Result<Item, PortError> {
    let currency = parse_currency(&row.currency)?;

    Ok(Item {
        id: ItemId::from_uuid(row.item_id),
        shop_id: ShopId::from_uuid(row.shop_id),
        name: row.name,
        description: row.description,
        sku: row.sku,
        price: Money::new(row.price, currency),
        cost_price: row.cost_price.map(|c| Money::new(c, currency)),
        tax_rate: row.tax_rate,
        category: row.category,
        quantity: row.quantity,
        min_quantity: row.min_quantity,
        unit: row.unit,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn item_to_row(item: &Item) -> ItemRow {
    ItemRow {
        item_id: item.id.into(),
        shop_id: item.shop_id.into(),
        name: item.name.clone(),
        description: item.description.clone(),
        sku: item.sku.clone(),
        price: item.price.amount(),
        cost_price: item.cost_price.map(|c| c.amount()),
        currency: item.price.currency().code().to_string(),
        tax_rate: item.tax_rate,
        category: item.category.clone(),
        quantity: item.quantity,
        min_quantity: item.min_quantity,
        unit: item.unit.clone(),
        is_active: item.is_active,
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

pub(crate) fn row_to_customer(row: CustomerRow) -> Customer {
    Customer {
        id: CustomerId::from_uuid(row.customer_id),
        shop_id: ShopId::from_uuid(row.shop_id),
        name: row.name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        city: row.city,
        state: row.state,
        country: row.country,
        postal_code: row.postal_code,
        tax_number: row.tax_number,
        notes: row.notes,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn customer_to_row(customer: &Customer) -> CustomerRow {
    CustomerRow {
        customer_id: customer.id.into(),
        shop_id: customer.shop_id.into(),
        name: customer.name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        address: customer.address.clone(),
        city: customer.city.clone(),
        state: customer.state.clone(),
        country: customer.country.clone(),
        postal_code: customer.postal_code.clone(),
        tax_number: customer.tax_number.clone(),
        notes: customer.notes.clone(),
        is_active: customer.is_active,
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    }
}
