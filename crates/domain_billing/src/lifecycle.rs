//! Bill lifecycle: create, list, read, update and delete

use chrono::Datelike;
use tracing::{info, instrument, warn};

use core_kernel::{BillId, Money, ShopId, UserId};

use crate::bill::{Bill, BillStatus};
use crate::error::BillingError;
use crate::ledger::{compute_totals, rebalance};
use crate::request::{BillFilter, BillRequest};
use crate::service::{BillingService, PreparedBill};

impl BillingService {
    /// Creates a draft bill, allocating its number and drawing down stock
    ///
    /// Lines, the stock adjustments and the bill itself are written in one
    /// transaction. A bill-number conflict detected by the store restarts
    /// the whole transaction, up to the allocator's attempt budget.
    #[instrument(skip(self, request), fields(%shop_id, %user_id))]
    pub async fn create_bill(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        request: BillRequest,
    ) -> Result<Bill, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;
        let prepared = self.prepare(&request)?;

        let max_attempts = self.allocator.max_attempts();
        let mut attempt = 0;
        let bill_id = loop {
            attempt += 1;
            match self.try_create(shop_id, user_id, &request, &prepared).await {
                Ok(bill_id) => break bill_id,
                Err(err) if err.is_conflict() => {
                    if attempt >= max_attempts {
                        return Err(BillingError::AllocationExhausted { attempts: max_attempts });
                    }
                    warn!(attempt, error = %err, "bill insert conflicted, restarting transaction");
                }
                Err(err) => return Err(err),
            }
        };

        self.load(shop_id, bill_id).await
    }

    async fn try_create(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        request: &BillRequest,
        prepared: &PreparedBill,
    ) -> Result<BillId, BillingError> {
        let mut tx = self.store.begin().await?;
        self.ensure_customer(tx.as_mut(), shop_id, request.customer_id).await?;

        let bill_id = BillId::new_v7();
        let now = self.clock.now();
        let lines = self
            .snapshot_lines(tx.as_mut(), shop_id, bill_id, &request.lines, now)
            .await?;
        let totals = compute_totals(&lines, prepared.tax_rate, prepared.discount)?;

        let bill_number = self
            .allocator
            .allocate(tx.as_mut(), shop_id, self.clock.today().year())
            .await?;

        let currency = self.settings.currency;
        let bill = Bill {
            id: bill_id,
            shop_id,
            customer_id: request.customer_id,
            bill_number,
            bill_date: prepared.bill_date,
            due_date: prepared.due_date,
            currency,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            total_amount: totals.total_amount,
            paid_amount: Money::zero(currency),
            balance: totals.total_amount,
            pending_amount: totals.total_amount,
            status: BillStatus::Draft,
            notes: request.notes.clone(),
            terms: request.terms.clone(),
            created_by: user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            lines,
            payments: Vec::new(),
            customer: None,
        };

        tx.insert_bill(&bill).await?;
        for line in &bill.lines {
            tx.adjust_item_quantity(shop_id, line.item_id, -line.quantity).await?;
        }
        tx.commit().await?;

        info!(
            bill_id = %bill.id,
            bill_number = %bill.bill_number,
            total = %bill.total_amount,
            "bill created"
        );
        Ok(bill.id)
    }

    /// Lists the shop's bills, newest created first
    ///
    /// A bill whose relations fail to load is logged and left out rather
    /// than failing the whole listing.
    #[instrument(skip(self, filter), fields(%shop_id, %user_id))]
    pub async fn get_bills(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        filter: BillFilter,
    ) -> Result<Vec<Bill>, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;
        let filter = filter.normalized();

        let ids = self.store.list_bill_ids(shop_id, &filter).await?;
        let mut bills = Vec::with_capacity(ids.len());
        for bill_id in ids {
            match self.store.load_bill(shop_id, bill_id).await {
                Ok(Some(bill)) => bills.push(bill),
                Ok(None) => {}
                Err(err) => warn!(%bill_id, error = %err, "skipping bill that failed to load"),
            }
        }
        Ok(bills)
    }

    #[instrument(skip(self), fields(%shop_id, %user_id))]
    pub async fn get_bill(
        &self,
        bill_id: BillId,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<Bill, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;
        self.load(shop_id, bill_id).await
    }

    /// Rewrites a draft bill from `request`
    ///
    /// Lines are replaced wholesale and totals recomputed; payments already
    /// recorded carry over into the new balance. Stock is not re-adjusted.
    #[instrument(skip(self, request), fields(%shop_id, %user_id))]
    pub async fn update_bill(
        &self,
        bill_id: BillId,
        shop_id: ShopId,
        user_id: UserId,
        request: BillRequest,
    ) -> Result<Bill, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;
        let prepared = self.prepare(&request)?;

        let mut tx = self.store.begin().await?;
        let existing = tx
            .find_bill(shop_id, bill_id)
            .await?
            .ok_or(BillingError::BillNotFound(bill_id))?;
        if !existing.status.is_mutable() {
            tx.rollback().await?;
            return Err(BillingError::invalid_state("only draft bills can be updated"));
        }

        self.ensure_customer(tx.as_mut(), shop_id, request.customer_id).await?;
        let now = self.clock.now();
        let lines = self
            .snapshot_lines(tx.as_mut(), shop_id, bill_id, &request.lines, now)
            .await?;
        let totals = compute_totals(&lines, prepared.tax_rate, prepared.discount)?;
        let balance = rebalance(&totals.total_amount, &existing.paid_amount)?;

        let updated = Bill {
            customer_id: request.customer_id,
            bill_date: prepared.bill_date,
            due_date: prepared.due_date,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            total_amount: totals.total_amount,
            balance,
            pending_amount: balance,
            notes: request.notes,
            terms: request.terms,
            updated_at: now,
            ..existing
        };

        tx.replace_lines(bill_id, &lines).await?;
        tx.update_bill(&updated).await?;
        tx.commit().await?;

        info!(%bill_id, total = %updated.total_amount, "bill updated");
        self.load(shop_id, bill_id).await
    }

    /// Soft-deletes a draft bill
    ///
    /// Stock drawn down at creation is not restored.
    #[instrument(skip(self), fields(%shop_id, %user_id))]
    pub async fn delete_bill(
        &self,
        bill_id: BillId,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<(), BillingError> {
        self.guard.check_access(shop_id, user_id).await?;

        let mut tx = self.store.begin().await?;
        let existing = tx
            .find_bill(shop_id, bill_id)
            .await?
            .ok_or(BillingError::BillNotFound(bill_id))?;
        if !existing.status.is_mutable() {
            tx.rollback().await?;
            return Err(BillingError::invalid_state("only draft bills can be deleted"));
        }

        tx.soft_delete_bill(shop_id, bill_id, self.clock.now()).await?;
        tx.commit().await?;

        info!(%bill_id, bill_number = %existing.bill_number, "bill deleted");
        Ok(())
    }
}
