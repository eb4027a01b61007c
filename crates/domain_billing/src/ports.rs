//! Billing Domain Ports
//!
//! Every write the billing service performs goes through a
//! [`BillingTransaction`] obtained from [`BillingStore::begin`]. A
//! transaction that is dropped without [`BillingTransaction::commit`] rolls
//! back, so a failed or cancelled operation never leaves partial writes.
//!
//! Adapters:
//!
//! - **PostgreSQL**: `infra_db::repositories::billing`
//! - **In-memory**: [`mock::InMemoryBillingStore`] behind the `mock` feature

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    BillId, CustomerId, DomainPort, HealthCheckable, ItemId, Money, PortError, ShopId,
};
use domain_catalog::{Customer, Item};

use crate::bill::{Bill, BillLine, BillStatus};
use crate::payment::Payment;
use crate::request::BillFilter;

/// Ledger-relevant columns of a bill, used for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillSummary {
    pub bill_date: NaiveDate,
    pub status: BillStatus,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub balance: Money,
}

impl From<&Bill> for BillSummary {
    fn from(bill: &Bill) -> Self {
        Self {
            bill_date: bill.bill_date,
            status: bill.status,
            total_amount: bill.total_amount,
            paid_amount: bill.paid_amount,
            balance: bill.balance,
        }
    }
}

/// Read side of bill persistence and the entry point for transactions
#[async_trait]
pub trait BillingStore: DomainPort + HealthCheckable {
    /// Opens a transaction
    async fn begin(&self) -> Result<Box<dyn BillingTransaction>, PortError>;

    /// Loads a non-deleted bill with its lines, payments and customer
    ///
    /// Returns `Ok(None)` when the bill does not exist in the shop. A bill
    /// whose relations cannot be loaded is an error.
    async fn load_bill(&self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError>;

    /// Ids of non-deleted bills matching `filter`, newest created first
    async fn list_bill_ids(&self, shop_id: ShopId, filter: &BillFilter) -> Result<Vec<BillId>, PortError>;

    /// Ledger columns of every non-deleted bill in the shop
    async fn bill_summaries(&self, shop_id: ShopId) -> Result<Vec<BillSummary>, PortError>;
}

/// A unit of work against the billing store
///
/// Bill lookups only see non-deleted bills of the given shop. Bill-number
/// checks are global and include soft-deleted bills, matching the unique
/// constraint on `bill_number`.
#[async_trait]
pub trait BillingTransaction: Send {
    /// Number of non-deleted bills in the shop
    async fn count_bills(&mut self, shop_id: ShopId) -> Result<u64, PortError>;

    async fn bill_number_exists(&mut self, bill_number: &str) -> Result<bool, PortError>;

    async fn get_item(&mut self, shop_id: ShopId, item_id: ItemId) -> Result<Option<Item>, PortError>;

    /// Adds `delta` to the item's stock; no floor is applied
    async fn adjust_item_quantity(
        &mut self,
        shop_id: ShopId,
        item_id: ItemId,
        delta: Decimal,
    ) -> Result<(), PortError>;

    async fn get_customer(
        &mut self,
        shop_id: ShopId,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, PortError>;

    /// Inserts the bill header and its lines
    ///
    /// Fails with `PortError::Conflict` if the bill number is taken.
    async fn insert_bill(&mut self, bill: &Bill) -> Result<(), PortError>;

    /// Loads the bill header for update, locking it until commit
    async fn find_bill(&mut self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError>;

    /// Writes every header column of `bill`
    async fn update_bill(&mut self, bill: &Bill) -> Result<(), PortError>;

    /// Deletes the bill's lines and inserts `lines` in their place
    async fn replace_lines(&mut self, bill_id: BillId, lines: &[BillLine]) -> Result<(), PortError>;

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError>;

    async fn soft_delete_bill(
        &mut self,
        shop_id: ShopId,
        bill_id: BillId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// In-memory billing store for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

    use core_kernel::{HealthCheckResult, OperationMetadata};
    use domain_catalog::CatalogPort;

    /// Transaction steps at which a failure can be injected
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailurePoint {
        InsertBill,
        AdjustItemQuantity,
        UpdateBill,
        InsertPayment,
        Commit,
    }

    #[derive(Debug, Clone, Copy)]
    struct Injected {
        point: FailurePoint,
        conflict: bool,
    }

    #[derive(Debug, Default, Clone)]
    struct StoreState {
        /// Creation order; lines and payments are held inline
        bills: Vec<Bill>,
        items: HashMap<ItemId, Item>,
        customers: HashMap<CustomerId, Customer>,
    }

    impl StoreState {
        fn live_bill(&self, shop_id: ShopId, bill_id: BillId) -> Option<&Bill> {
            self.bills
                .iter()
                .find(|b| b.id == bill_id && b.shop_id == shop_id && !b.is_deleted())
        }

        fn bill_mut(&mut self, bill_id: BillId) -> Result<&mut Bill, PortError> {
            self.bills
                .iter_mut()
                .find(|b| b.id == bill_id)
                .ok_or_else(|| PortError::not_found("Bill", bill_id))
        }
    }

    /// Single-process store that serializes transactions on one lock
    ///
    /// Also implements [`CatalogPort`] so catalog and billing operations in
    /// a test share the same items and customers.
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryBillingStore {
        state: Arc<RwLock<StoreState>>,
        failures: Arc<Mutex<Vec<Injected>>>,
        rollbacks: Arc<AtomicUsize>,
    }

    impl InMemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn seed_item(&self, item: Item) {
            self.state.write().await.items.insert(item.id, item);
        }

        pub async fn seed_customer(&self, customer: Customer) {
            self.state.write().await.customers.insert(customer.id, customer);
        }

        /// Stores a bill as-is, bypassing every rule
        pub async fn seed_bill(&self, bill: Bill) {
            self.state.write().await.bills.push(bill);
        }

        /// Removes a customer while leaving bills that reference it
        pub async fn remove_customer(&self, customer_id: CustomerId) {
            self.state.write().await.customers.remove(&customer_id);
        }

        pub async fn item(&self, item_id: ItemId) -> Option<Item> {
            self.state.read().await.items.get(&item_id).cloned()
        }

        pub async fn item_count(&self, shop_id: ShopId) -> usize {
            self.state
                .read()
                .await
                .items
                .values()
                .filter(|i| i.shop_id == shop_id)
                .count()
        }

        /// Raw stored bill, soft-deleted ones included
        pub async fn stored_bill(&self, bill_id: BillId) -> Option<Bill> {
            self.state
                .read()
                .await
                .bills
                .iter()
                .find(|b| b.id == bill_id)
                .cloned()
        }

        /// Transactions ended by an explicit rollback
        pub fn rollbacks(&self) -> usize {
            self.rollbacks.load(Ordering::SeqCst)
        }

        /// Makes the next operation at `point` fail with an internal error
        pub fn fail_once(&self, point: FailurePoint) {
            self.inject(point, false);
        }

        /// Makes the next operation at `point` fail with a conflict
        pub fn conflict_once(&self, point: FailurePoint) {
            self.inject(point, true);
        }

        fn inject(&self, point: FailurePoint, conflict: bool) {
            if let Ok(mut failures) = self.failures.lock() {
                failures.push(Injected { point, conflict });
            }
        }
    }

    impl DomainPort for InMemoryBillingStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillingStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-billing", 0)
                .with_message("In-memory adapter always healthy")
        }
    }

    #[async_trait]
    impl BillingStore for InMemoryBillingStore {
        async fn begin(&self) -> Result<Box<dyn BillingTransaction>, PortError> {
            let guard = self.state.clone().write_owned().await;
            let working = guard.clone();
            Ok(Box::new(InMemoryBillingTransaction {
                guard,
                working,
                failures: self.failures.clone(),
                rollbacks: self.rollbacks.clone(),
            }))
        }

        async fn load_bill(&self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError> {
            let state = self.state.read().await;
            let Some(bill) = state.live_bill(shop_id, bill_id) else {
                return Ok(None);
            };

            let mut bill = bill.clone();
            if let Some(customer_id) = bill.customer_id {
                let customer = state
                    .customers
                    .get(&customer_id)
                    .filter(|c| c.shop_id == shop_id)
                    .cloned()
                    .ok_or_else(|| PortError::not_found("Customer", customer_id))?;
                bill.customer = Some(customer);
            }
            Ok(Some(bill))
        }

        async fn list_bill_ids(&self, shop_id: ShopId, filter: &BillFilter) -> Result<Vec<BillId>, PortError> {
            let state = self.state.read().await;
            let mut matching: Vec<&Bill> = state
                .bills
                .iter()
                .filter(|b| b.shop_id == shop_id && !b.is_deleted() && filter.matches(b))
                .collect();
            // Stable sort keeps creation order for equal timestamps
            matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(matching.into_iter().rev().map(|b| b.id).collect())
        }

        async fn bill_summaries(&self, shop_id: ShopId) -> Result<Vec<BillSummary>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .bills
                .iter()
                .filter(|b| b.shop_id == shop_id && !b.is_deleted())
                .map(BillSummary::from)
                .collect())
        }
    }

    #[async_trait]
    impl CatalogPort for InMemoryBillingStore {
        async fn insert_items(
            &self,
            items: Vec<Item>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Item>, PortError> {
            let mut state = self.state.write().await;
            for item in &items {
                state.items.insert(item.id, item.clone());
            }
            Ok(items)
        }

        async fn get_item(
            &self,
            shop_id: ShopId,
            item_id: ItemId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Item>, PortError> {
            let state = self.state.read().await;
            Ok(state.items.get(&item_id).filter(|i| i.shop_id == shop_id).cloned())
        }

        async fn insert_customer(
            &self,
            customer: Customer,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Customer, PortError> {
            self.state.write().await.customers.insert(customer.id, customer.clone());
            Ok(customer)
        }

        async fn get_customer(
            &self,
            shop_id: ShopId,
            customer_id: CustomerId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Customer>, PortError> {
            let state = self.state.read().await;
            Ok(state.customers.get(&customer_id).filter(|c| c.shop_id == shop_id).cloned())
        }
    }

    /// Works on a copy of the state; commit swaps it in under the held lock
    pub struct InMemoryBillingTransaction {
        guard: OwnedRwLockWriteGuard<StoreState>,
        working: StoreState,
        failures: Arc<Mutex<Vec<Injected>>>,
        rollbacks: Arc<AtomicUsize>,
    }

    impl InMemoryBillingTransaction {
        fn check(&self, point: FailurePoint) -> Result<(), PortError> {
            let injected = match self.failures.lock() {
                Ok(mut failures) => failures
                    .iter()
                    .position(|f| f.point == point)
                    .map(|index| failures.remove(index)),
                Err(_) => None,
            };
            match injected {
                Some(f) if f.conflict => Err(PortError::conflict(format!("injected conflict at {:?}", point))),
                Some(_) => Err(PortError::internal(format!("injected failure at {:?}", point))),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl BillingTransaction for InMemoryBillingTransaction {
        async fn count_bills(&mut self, shop_id: ShopId) -> Result<u64, PortError> {
            Ok(self
                .working
                .bills
                .iter()
                .filter(|b| b.shop_id == shop_id && !b.is_deleted())
                .count() as u64)
        }

        async fn bill_number_exists(&mut self, bill_number: &str) -> Result<bool, PortError> {
            Ok(self.working.bills.iter().any(|b| b.bill_number == bill_number))
        }

        async fn get_item(&mut self, shop_id: ShopId, item_id: ItemId) -> Result<Option<Item>, PortError> {
            Ok(self
                .working
                .items
                .get(&item_id)
                .filter(|i| i.shop_id == shop_id)
                .cloned())
        }

        async fn adjust_item_quantity(
            &mut self,
            shop_id: ShopId,
            item_id: ItemId,
            delta: Decimal,
        ) -> Result<(), PortError> {
            self.check(FailurePoint::AdjustItemQuantity)?;
            let item = self
                .working
                .items
                .get_mut(&item_id)
                .filter(|i| i.shop_id == shop_id)
                .ok_or_else(|| PortError::not_found("Item", item_id))?;
            item.quantity += delta;
            item.updated_at = Utc::now();
            Ok(())
        }

        async fn get_customer(
            &mut self,
            shop_id: ShopId,
            customer_id: CustomerId,
        ) -> Result<Option<Customer>, PortError> {
            Ok(self
                .working
                .customers
                .get(&customer_id)
                .filter(|c| c.shop_id == shop_id)
                .cloned())
        }

        async fn insert_bill(&mut self, bill: &Bill) -> Result<(), PortError> {
            self.check(FailurePoint::InsertBill)?;
            if self.working.bills.iter().any(|b| b.bill_number == bill.bill_number) {
                return Err(PortError::conflict(format!(
                    "bill_number {} already exists",
                    bill.bill_number
                )));
            }
            let mut stored = bill.clone();
            stored.customer = None;
            self.working.bills.push(stored);
            Ok(())
        }

        async fn find_bill(&mut self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError> {
            Ok(self.working.live_bill(shop_id, bill_id).map(Bill::header))
        }

        async fn update_bill(&mut self, bill: &Bill) -> Result<(), PortError> {
            self.check(FailurePoint::UpdateBill)?;
            let stored = self.working.bill_mut(bill.id)?;
            let lines = std::mem::take(&mut stored.lines);
            let payments = std::mem::take(&mut stored.payments);
            *stored = bill.header();
            stored.lines = lines;
            stored.payments = payments;
            Ok(())
        }

        async fn replace_lines(&mut self, bill_id: BillId, lines: &[BillLine]) -> Result<(), PortError> {
            self.working.bill_mut(bill_id)?.lines = lines.to_vec();
            Ok(())
        }

        async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
            self.check(FailurePoint::InsertPayment)?;
            self.working.bill_mut(payment.bill_id)?.payments.push(payment.clone());
            Ok(())
        }

        async fn soft_delete_bill(
            &mut self,
            shop_id: ShopId,
            bill_id: BillId,
            deleted_at: DateTime<Utc>,
        ) -> Result<(), PortError> {
            let bill = self
                .working
                .bills
                .iter_mut()
                .find(|b| b.id == bill_id && b.shop_id == shop_id && !b.is_deleted())
                .ok_or_else(|| PortError::not_found("Bill", bill_id))?;
            bill.deleted_at = Some(deleted_at);
            bill.updated_at = deleted_at;
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            self.check(FailurePoint::Commit)?;
            let InMemoryBillingTransaction { mut guard, working, .. } = *self;
            *guard = working;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), PortError> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
