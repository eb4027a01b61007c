//! Catalog Domain Ports

use async_trait::async_trait;

use core_kernel::{
    CustomerId, DomainPort, HealthCheckable, ItemId, OperationMetadata, PortError, ShopId,
};

use crate::customer::Customer;
use crate::item::Item;

/// Port for catalog persistence
///
/// Lookups are always scoped by shop: an id belonging to another shop reads
/// as absent.
#[async_trait]
pub trait CatalogPort: DomainPort + HealthCheckable {
    /// Inserts every item or none of them
    async fn insert_items(
        &self,
        items: Vec<Item>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Item>, PortError>;

    async fn get_item(
        &self,
        shop_id: ShopId,
        item_id: ItemId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Item>, PortError>;

    async fn insert_customer(
        &self,
        customer: Customer,
        metadata: Option<OperationMetadata>,
    ) -> Result<Customer, PortError>;

    async fn get_customer(
        &self,
        shop_id: ShopId,
        customer_id: CustomerId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Customer>, PortError>;
}

/// In-memory catalog for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryCatalogPort {
        items: Arc<RwLock<HashMap<ItemId, Item>>>,
        customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    }

    impl InMemoryCatalogPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn item_count(&self, shop_id: ShopId) -> usize {
            self.items
                .read()
                .await
                .values()
                .filter(|i| i.shop_id == shop_id)
                .count()
        }
    }

    impl DomainPort for InMemoryCatalogPort {}

    #[async_trait]
    impl HealthCheckable for InMemoryCatalogPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-catalog", 0)
        }
    }

    #[async_trait]
    impl CatalogPort for InMemoryCatalogPort {
        async fn insert_items(
            &self,
            items: Vec<Item>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Item>, PortError> {
            let mut store = self.items.write().await;
            if let Some(dup) = items.iter().find(|i| store.contains_key(&i.id)) {
                return Err(PortError::conflict(format!("item {} already exists", dup.id)));
            }
            for item in &items {
                store.insert(item.id, item.clone());
            }
            Ok(items)
        }

        async fn get_item(
            &self,
            shop_id: ShopId,
            item_id: ItemId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Item>, PortError> {
            Ok(self
                .items
                .read()
                .await
                .get(&item_id)
                .filter(|i| i.shop_id == shop_id)
                .cloned())
        }

        async fn insert_customer(
            &self,
            customer: Customer,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Customer, PortError> {
            self.customers.write().await.insert(customer.id, customer.clone());
            Ok(customer)
        }

        async fn get_customer(
            &self,
            shop_id: ShopId,
            customer_id: CustomerId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Customer>, PortError> {
            Ok(self
                .customers
                .read()
                .await
                .get(&customer_id)
                .filter(|c| c.shop_id == shop_id)
                .cloned())
        }
    }
}
