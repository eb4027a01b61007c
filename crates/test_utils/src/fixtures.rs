//! Pre-built Test Fixtures
//!
//! [`BillingWorld`] is a shop with one member, one outsider, one stocked
//! item and one customer, wired to in-memory adapters and a fixed clock.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Currency, FixedClock, Money, ShopId, UserId};
use domain_billing::{BillingService, BillingSettings, InMemoryBillingStore};
use domain_catalog::{CatalogService, Customer, Item};
use domain_shop::{AccessGuard, InMemoryMembershipPort, MembershipRole};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::builders::{CustomerRequestBuilder, ItemRequestBuilder};

/// The date the world's clock is frozen on
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

/// Formats a date the way bill requests carry it
pub fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Shorthand for a USD amount
pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

/// A shop wired to in-memory adapters
pub struct BillingWorld {
    pub shop: ShopId,
    /// Active cashier of `shop`
    pub member: UserId,
    /// A user with no membership anywhere
    pub outsider: UserId,
    /// Priced at 100 with 10 in stock
    pub item: Item,
    pub customer: Customer,
    pub memberships: InMemoryMembershipPort,
    pub store: InMemoryBillingStore,
    pub clock: Arc<FixedClock>,
    pub billing: BillingService,
    pub catalog: CatalogService,
}

impl BillingWorld {
    pub async fn new() -> Self {
        Self::with_settings(BillingSettings::default()).await
    }

    pub async fn with_settings(settings: BillingSettings) -> Self {
        let shop = ShopId::new();
        let member = UserId::new();
        let outsider = UserId::new();

        let memberships = InMemoryMembershipPort::new();
        memberships.grant(shop, member, MembershipRole::Cashier).await;

        let store = InMemoryBillingStore::new();
        let item = ItemRequestBuilder::new("Widget")
            .price(dec!(100))
            .quantity(dec!(10))
            .build()
            .into_item(shop, settings.currency);
        store.seed_item(item.clone()).await;

        let customer = CustomerRequestBuilder::new().build().into_customer(shop);
        store.seed_customer(customer.clone()).await;

        let clock = Arc::new(FixedClock::on_date(reference_date()));
        let guard = AccessGuard::new(Arc::new(memberships.clone()));
        let catalog = CatalogService::new(Arc::new(store.clone()), guard.clone(), settings.currency);
        let billing = BillingService::new(Arc::new(store.clone()), guard, settings)
            .with_clock(clock.clone());

        Self {
            shop,
            member,
            outsider,
            item,
            customer,
            memberships,
            store,
            clock,
            billing,
            catalog,
        }
    }

    /// Adds a second shop sharing this world's store, with its own member
    pub async fn second_shop(&self) -> (ShopId, UserId) {
        let shop = ShopId::new();
        let user = UserId::new();
        self.memberships.grant(shop, user, MembershipRole::Owner).await;
        (shop, user)
    }

    /// Current stock of the world's item
    pub async fn stock(&self) -> Decimal {
        self.store
            .item(self.item.id)
            .await
            .map(|item| item.quantity)
            .unwrap_or_default()
    }
}
