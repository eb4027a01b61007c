//! Billing Service
//!
//! Application service that owns the bill lifecycle, payment recording and
//! statistics. Operations are split across `lifecycle`, `recorder` and
//! `stats`; this module holds the shared wiring and request preparation.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use core_kernel::{
    parse_calendar_date, parse_optional_date, BillId, Clock, CustomerId, Money, Rate, ShopId,
    SystemClock,
};
use domain_shop::AccessGuard;

use crate::bill::{Bill, BillLine};
use crate::error::BillingError;
use crate::numbering::BillNumberAllocator;
use crate::ports::{BillingStore, BillingTransaction};
use crate::request::{BillLineRequest, BillRequest};
use crate::settings::BillingSettings;

/// Entry point for every billing operation
#[derive(Clone)]
pub struct BillingService {
    pub(crate) store: Arc<dyn BillingStore>,
    pub(crate) guard: AccessGuard,
    pub(crate) allocator: BillNumberAllocator,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: BillingSettings,
}

/// A bill request with its dates parsed and amounts typed
#[derive(Debug, Clone)]
pub(crate) struct PreparedBill {
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Rate,
    pub discount: Money,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, guard: AccessGuard, settings: BillingSettings) -> Self {
        let allocator = BillNumberAllocator::new(
            settings.bill_number_prefix.clone(),
            settings.max_allocation_attempts,
        );
        Self {
            store,
            guard,
            allocator,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Replaces the wall clock, e.g. with a `FixedClock` in tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Validates a bill request and parses its dates
    pub(crate) fn prepare(&self, request: &BillRequest) -> Result<PreparedBill, BillingError> {
        request.validate()?;
        let bill_date = parse_calendar_date("bill_date", &request.bill_date)?;
        let due_date = parse_optional_date("due_date", request.due_date.as_deref())?;

        Ok(PreparedBill {
            bill_date,
            due_date,
            tax_rate: Rate::from_percentage(request.tax_rate),
            discount: Money::new(request.discount, self.settings.currency),
        })
    }

    pub(crate) async fn ensure_customer(
        &self,
        tx: &mut dyn BillingTransaction,
        shop_id: ShopId,
        customer_id: Option<CustomerId>,
    ) -> Result<(), BillingError> {
        if let Some(customer_id) = customer_id {
            tx.get_customer(shop_id, customer_id)
                .await?
                .ok_or(BillingError::CustomerNotFound(customer_id))?;
        }
        Ok(())
    }

    /// Builds bill lines, copying each item's current name
    pub(crate) async fn snapshot_lines(
        &self,
        tx: &mut dyn BillingTransaction,
        shop_id: ShopId,
        bill_id: BillId,
        requested: &[BillLineRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<BillLine>, BillingError> {
        let mut lines = Vec::with_capacity(requested.len());
        for line in requested {
            let item = tx
                .get_item(shop_id, line.item_id)
                .await?
                .ok_or(BillingError::ItemNotFound(line.item_id))?;

            lines.push(BillLine::new(
                bill_id,
                item.id,
                item.name,
                line.description.clone(),
                line.quantity,
                Money::new(line.unit_price, self.settings.currency),
                now,
            )?);
        }
        Ok(lines)
    }

    /// Loads a hydrated bill or reports it missing
    pub(crate) async fn load(&self, shop_id: ShopId, bill_id: BillId) -> Result<Bill, BillingError> {
        self.store
            .load_bill(shop_id, bill_id)
            .await?
            .ok_or(BillingError::BillNotFound(bill_id))
    }
}

impl std::fmt::Debug for BillingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService")
            .field("allocator", &self.allocator)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
