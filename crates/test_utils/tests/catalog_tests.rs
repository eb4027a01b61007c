//! Catalog operations sharing the billing store

use domain_catalog::CatalogError;
use rust_decimal_macros::dec;
use test_utils::{BillRequestBuilder, BillingWorld, CustomerRequestBuilder, ItemRequestBuilder};

#[tokio::test]
async fn bulk_create_is_all_or_nothing() {
    let world = BillingWorld::new().await;
    let requests = vec![
        ItemRequestBuilder::new("Bolt").price(dec!(0.25)).quantity(dec!(500)).build(),
        ItemRequestBuilder::new("Nut").price(dec!(0)).build(),
        ItemRequestBuilder::new("Washer").price(dec!(0.05)).build(),
    ];

    let err = world
        .catalog
        .bulk_create_items(world.shop, world.member, requests)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidItem { index: 1, .. }));
    // Only the fixture item exists
    assert_eq!(world.store.item_count(world.shop).await, 1);
}

#[tokio::test]
async fn created_items_are_billable() {
    let world = BillingWorld::new().await;

    let items = world
        .catalog
        .bulk_create_items(
            world.shop,
            world.member,
            vec![
                ItemRequestBuilder::new("Bolt").price(dec!(0.25)).quantity(dec!(500)).build(),
                ItemRequestBuilder::new("Washer").price(dec!(0.05)).unit("box").build(),
            ],
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].unit, "box");
    assert_eq!(world.store.item_count(world.shop).await, 3);

    let bill = world
        .billing
        .create_bill(
            world.shop,
            world.member,
            BillRequestBuilder::new()
                .line(items[0].id, dec!(40), dec!(0.25))
                .line(items[1].id, dec!(10), dec!(0.05))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(bill.lines[0].item_name, "Bolt");
    let bolt = world
        .catalog
        .get_item(world.shop, world.member, items[0].id)
        .await
        .unwrap();
    assert_eq!(bolt.quantity, dec!(460));
}

#[tokio::test]
async fn outsider_cannot_touch_the_catalog() {
    let world = BillingWorld::new().await;

    let err = world
        .catalog
        .bulk_create_items(
            world.shop,
            world.outsider,
            vec![ItemRequestBuilder::new("Bolt").build()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AccessDenied { .. }));

    let err = world
        .catalog
        .get_item(world.shop, world.outsider, world.item.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AccessDenied { .. }));
}

#[tokio::test]
async fn items_are_scoped_to_their_shop() {
    let world = BillingWorld::new().await;
    let (other_shop, other_user) = world.second_shop().await;

    let err = world
        .catalog
        .get_item(other_shop, other_user, world.item.id)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::ItemNotFound(id) if id == world.item.id));
}

#[tokio::test]
async fn created_customer_can_be_billed() {
    let world = BillingWorld::new().await;
    let customer = world
        .catalog
        .create_customer(
            world.shop,
            world.member,
            CustomerRequestBuilder::new().name("Acme Traders").tax_number("GST-123").build(),
        )
        .await
        .unwrap();

    let bill = world
        .billing
        .create_bill(
            world.shop,
            world.member,
            BillRequestBuilder::new()
                .customer(customer.id)
                .line(world.item.id, dec!(1), dec!(100))
                .build(),
        )
        .await
        .unwrap();

    let hydrated = bill.customer.unwrap();
    assert_eq!(hydrated.name, "Acme Traders");
    assert_eq!(hydrated.tax_number.as_deref(), Some("GST-123"));
}

#[tokio::test]
async fn nameless_customer_is_rejected() {
    let world = BillingWorld::new().await;

    let err = world
        .catalog
        .create_customer(world.shop, world.member, CustomerRequestBuilder::new().name("  ").build())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidCustomer(_)));
}
