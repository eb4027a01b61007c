//! Catalog Service
//!
//! Shop-scoped item and customer operations behind the access guard.

use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{Currency, ItemId, OperationMetadata, ShopId, UserId};
use domain_shop::AccessGuard;

use crate::customer::{Customer, CustomerRequest};
use crate::error::CatalogError;
use crate::item::{Item, ItemRequest};
use crate::ports::CatalogPort;

#[derive(Clone)]
pub struct CatalogService {
    port: Arc<dyn CatalogPort>,
    guard: AccessGuard,
    currency: Currency,
}

impl CatalogService {
    pub fn new(port: Arc<dyn CatalogPort>, guard: AccessGuard, currency: Currency) -> Self {
        Self { port, guard, currency }
    }

    /// Creates a batch of items, all or nothing
    ///
    /// Every request is validated before anything is written; the first
    /// invalid entry rejects the whole batch with its position.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn bulk_create_items(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        requests: Vec<ItemRequest>,
    ) -> Result<Vec<Item>, CatalogError> {
        self.guard.check_access(shop_id, user_id).await?;

        for (index, request) in requests.iter().enumerate() {
            request
                .validate()
                .map_err(|reason| CatalogError::InvalidItem { index, reason })?;
        }

        let items: Vec<Item> = requests
            .into_iter()
            .map(|r| r.into_item(shop_id, self.currency))
            .collect();

        let created = self.port.insert_items(items, Some(metadata(user_id))).await?;
        info!(%shop_id, created = created.len(), "items created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Item, CatalogError> {
        self.guard.check_access(shop_id, user_id).await?;
        self.port
            .get_item(shop_id, item_id, Some(metadata(user_id)))
            .await?
            .ok_or(CatalogError::ItemNotFound(item_id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        request: CustomerRequest,
    ) -> Result<Customer, CatalogError> {
        self.guard.check_access(shop_id, user_id).await?;
        request.validate().map_err(CatalogError::InvalidCustomer)?;

        let customer = self
            .port
            .insert_customer(request.into_customer(shop_id), Some(metadata(user_id)))
            .await?;
        info!(%shop_id, customer_id = %customer.id, "customer created");
        Ok(customer)
    }
}

fn metadata(user_id: UserId) -> OperationMetadata {
    OperationMetadata::default().initiated_by(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryCatalogPort;
    use domain_shop::{InMemoryMembershipPort, MembershipRole};
    use rust_decimal_macros::dec;

    async fn setup() -> (CatalogService, Arc<InMemoryCatalogPort>, ShopId, UserId) {
        let memberships = InMemoryMembershipPort::new();
        let (shop, user) = (ShopId::new(), UserId::new());
        memberships.grant(shop, user, MembershipRole::Owner).await;

        let port = Arc::new(InMemoryCatalogPort::new());
        let service = CatalogService::new(
            port.clone(),
            AccessGuard::new(Arc::new(memberships)),
            Currency::USD,
        );
        (service, port, shop, user)
    }

    fn item(name: &str, price: rust_decimal::Decimal) -> ItemRequest {
        ItemRequest {
            name: name.to_string(),
            price,
            quantity: dec!(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bulk_create_inserts_every_item() {
        let (service, port, shop, user) = setup().await;

        let created = service
            .bulk_create_items(shop, user, vec![item("Pen", dec!(1.5)), item("Notebook", dec!(4))])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(port.item_count(shop).await, 2);

        let fetched = service.get_item(shop, user, created[1].id).await.unwrap();
        assert_eq!(fetched.name, "Notebook");
    }

    #[tokio::test]
    async fn test_bulk_create_rejects_whole_batch() {
        let (service, port, shop, user) = setup().await;

        let err = service
            .bulk_create_items(
                shop,
                user,
                vec![item("Pen", dec!(1.5)), item("", dec!(2)), item("Ink", dec!(0))],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::InvalidItem { index: 1, .. }));
        assert_eq!(port.item_count(shop).await, 0);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_items() {
        let (service, _port, shop, user) = setup().await;
        let created = service
            .bulk_create_items(shop, user, vec![item("Pen", dec!(1.5))])
            .await
            .unwrap();

        let err = service.get_item(shop, UserId::new(), created[0].id).await.unwrap_err();
        assert!(matches!(err, CatalogError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_item_lookup_is_shop_scoped() {
        let (service, _port, shop, user) = setup().await;
        let created = service
            .bulk_create_items(shop, user, vec![item("Pen", dec!(1.5))])
            .await
            .unwrap();

        let err = service.get_item(shop, user, ItemId::new()).await.unwrap_err();
        assert!(matches!(err, CatalogError::ItemNotFound(_)));
        assert_eq!(created[0].shop_id, shop);
    }

    #[tokio::test]
    async fn test_customer_requires_name() {
        let (service, _port, shop, user) = setup().await;

        let err = service
            .create_customer(shop, user, CustomerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCustomer(_)));

        let customer = service
            .create_customer(
                shop,
                user,
                CustomerRequest { name: "Asha Traders".to_string(), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(customer.shop_id, shop);
    }
}
