//! PostgreSQL Billing Adapter
//!
//! Implements `BillingStore` and `BillingTransaction` on top of the
//! billing and catalog repositories. A `PostgresBillingTransaction` wraps
//! one `sqlx::Transaction`; dropping it without commit rolls back.
//!
//! # Error Handling
//!
//! - `DatabaseError::DuplicateEntry` (bill number taken) -> `PortError::Conflict`
//! - `DatabaseError::NotFound` -> `PortError::NotFound`
//! - Other errors -> `PortError::Internal`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    BillId, BillLineId, Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    ItemId, Money, PaymentId, PortError, ShopId, UserId,
};
use domain_billing::{
    Bill, BillFilter, BillLine, BillStatus, BillSummary, BillingStore, BillingTransaction,
    Payment, PaymentMethod,
};
use domain_catalog::{Customer, Item};

use super::catalog::{row_to_customer, row_to_item};
use super::parse_currency;
use crate::error::DatabaseError;
use crate::repositories::billing::{
    BillLineRow, BillQuery, BillRow, BillSummaryRow, BillingRepository, PaymentRow,
    BillStatus as DbBillStatus, PaymentMethod as DbPaymentMethod,
};
use crate::repositories::catalog::CatalogRepository;

const ADAPTER_ID: &str = "postgres-billing-store";

/// PostgreSQL-backed implementation of the BillingStore trait
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillingRepository {
        &self.repository
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), ADAPTER_ID).await
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    async fn begin(&self) -> Result<Box<dyn BillingTransaction>, PortError> {
        let tx = self
            .repository
            .pool()
            .begin()
            .await
            .map_err(DatabaseError::from)?;

        Ok(Box::new(PostgresBillingTransaction { tx }))
    }

    #[instrument(skip(self), fields(shop_id = %shop_id, bill_id = %bill_id))]
    async fn load_bill(&self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError> {
        let mut conn = self
            .repository
            .pool()
            .acquire()
            .await
            .map_err(DatabaseError::from)?;

        let Some(row) =
            BillingRepository::find_bill(&mut conn, shop_id.into(), bill_id.into(), false).await?
        else {
            return Ok(None);
        };

        let lines = BillingRepository::find_lines(&mut conn, row.bill_id).await?;
        let payments = BillingRepository::find_payments(&mut conn, row.bill_id).await?;

        let customer = match row.customer_id {
            Some(customer_id) => {
                let customer_row =
                    CatalogRepository::find_customer(&mut conn, row.shop_id, customer_id, true)
                        .await?
                        .ok_or_else(|| PortError::not_found("Customer", customer_id))?;
                Some(row_to_customer(customer_row))
            }
            None => None,
        };

        debug!(lines = lines.len(), payments = payments.len(), "Bill hydrated");
        row_to_bill(row, lines, payments, customer).map(Some)
    }

    #[instrument(skip(self, filter), fields(shop_id = %shop_id))]
    async fn list_bill_ids(&self, shop_id: ShopId, filter: &BillFilter) -> Result<Vec<BillId>, PortError> {
        let query = BillQuery {
            shop_id: shop_id.into(),
            search: filter.search.clone(),
            status: filter.status.map(domain_to_db_status),
            customer_id: filter.customer_id.map(Into::into),
            start_date: filter.start_date,
            end_date: filter.end_date,
        };

        let ids = self.repository.search_bill_ids(&query).await?;
        Ok(ids.into_iter().map(BillId::from_uuid).collect())
    }

    async fn bill_summaries(&self, shop_id: ShopId) -> Result<Vec<BillSummary>, PortError> {
        self.repository
            .summaries(shop_id.into())
            .await?
            .into_iter()
            .map(row_to_summary)
            .collect()
    }
}

/// A billing unit of work on one PostgreSQL transaction
pub struct PostgresBillingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BillingTransaction for PostgresBillingTransaction {
    async fn count_bills(&mut self, shop_id: ShopId) -> Result<u64, PortError> {
        let count = BillingRepository::count_live_bills(&mut self.tx, shop_id.into()).await?;
        Ok(count.max(0) as u64)
    }

    async fn bill_number_exists(&mut self, bill_number: &str) -> Result<bool, PortError> {
        Ok(BillingRepository::bill_number_exists(&mut self.tx, bill_number).await?)
    }

    async fn get_item(&mut self, shop_id: ShopId, item_id: ItemId) -> Result<Option<Item>, PortError> {
        CatalogRepository::find_item(&mut self.tx, shop_id.into(), item_id.into())
            .await?
            .map(row_to_item)
            .transpose()
    }

    async fn adjust_item_quantity(
        &mut self,
        shop_id: ShopId,
        item_id: ItemId,
        delta: Decimal,
    ) -> Result<(), PortError> {
        CatalogRepository::adjust_quantity(&mut self.tx, shop_id.into(), item_id.into(), delta).await?;
        Ok(())
    }

    async fn get_customer(
        &mut self,
        shop_id: ShopId,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, PortError> {
        let row =
            CatalogRepository::find_customer(&mut self.tx, shop_id.into(), customer_id.into(), false)
                .await?;
        Ok(row.map(row_to_customer))
    }

    async fn insert_bill(&mut self, bill: &Bill) -> Result<(), PortError> {
        BillingRepository::insert_bill(&mut self.tx, &bill_to_row(bill)).await?;

        let lines: Vec<BillLineRow> = bill.lines.iter().map(line_to_row).collect();
        BillingRepository::insert_lines(&mut self.tx, &lines).await?;
        Ok(())
    }

    async fn find_bill(&mut self, shop_id: ShopId, bill_id: BillId) -> Result<Option<Bill>, PortError> {
        BillingRepository::find_bill(&mut self.tx, shop_id.into(), bill_id.into(), true)
            .await?
            .map(|row| row_to_bill(row, Vec::new(), Vec::new(), None))
            .transpose()
    }

    async fn update_bill(&mut self, bill: &Bill) -> Result<(), PortError> {
        BillingRepository::update_bill(&mut self.tx, &bill_to_row(bill)).await?;
        Ok(())
    }

    async fn replace_lines(&mut self, bill_id: BillId, lines: &[BillLine]) -> Result<(), PortError> {
        BillingRepository::delete_lines(&mut self.tx, bill_id.into()).await?;

        let rows: Vec<BillLineRow> = lines.iter().map(line_to_row).collect();
        BillingRepository::insert_lines(&mut self.tx, &rows).await?;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), PortError> {
        BillingRepository::insert_payment(&mut self.tx, &payment_to_row(payment)).await?;
        Ok(())
    }

    async fn soft_delete_bill(
        &mut self,
        shop_id: ShopId,
        bill_id: BillId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        BillingRepository::soft_delete_bill(&mut self.tx, shop_id.into(), bill_id.into(), deleted_at)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let PostgresBillingTransaction { tx } = *self;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        let PostgresBillingTransaction { tx } = *self;
        tx.rollback().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn row_to_bill(
    row: BillRow,
    lines: Vec<BillLineRow>,
    payments: Vec<PaymentRow>,
    customer: Option<Customer>,
) -> Result<Bill, PortError> {
    let currency = parse_currency(&row.currency)?;
    let money = |amount: Decimal| Money::new(amount, currency);

    Ok(Bill {
        id: BillId::from_uuid(row.bill_id),
        shop_id: ShopId::from_uuid(row.shop_id),
        customer_id: row.customer_id.map(CustomerId::from_uuid),
        bill_number: row.bill_number,
        bill_date: row.bill_date,
        due_date: row.due_date,
        currency,
        subtotal: money(row.subtotal),
        tax_amount: money(row.tax_amount),
        discount_amount: money(row.discount_amount),
        total_amount: money(row.total_amount),
        paid_amount: money(row.paid_amount),
        balance: money(row.balance),
        pending_amount: money(row.pending_amount),
        status: db_to_domain_status(row.status),
        notes: row.notes,
        terms: row.payment_terms,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        lines: lines.into_iter().map(|l| row_to_line(l, currency)).collect(),
        payments: payments.into_iter().map(|p| row_to_payment(p, currency)).collect(),
        customer,
    })
}

fn bill_to_row(bill: &Bill) -> BillRow {
    BillRow {
        bill_id: bill.id.into(),
        shop_id: bill.shop_id.into(),
        customer_id: bill.customer_id.map(Into::into),
        bill_number: bill.bill_number.clone(),
        bill_date: bill.bill_date,
        due_date: bill.due_date,
        currency: bill.currency.code().to_string(),
        subtotal: bill.subtotal.amount(),
        tax_amount: bill.tax_amount.amount(),
        discount_amount: bill.discount_amount.amount(),
        total_amount: bill.total_amount.amount(),
        paid_amount: bill.paid_amount.amount(),
        balance: bill.balance.amount(),
        pending_amount: bill.pending_amount.amount(),
        status: domain_to_db_status(bill.status),
        notes: bill.notes.clone(),
        payment_terms: bill.terms.clone(),
        created_by: bill.created_by.into(),
        created_at: bill.created_at,
        updated_at: bill.updated_at,
        deleted_at: bill.deleted_at,
    }
}

fn row_to_line(row: BillLineRow, currency: Currency) -> BillLine {
    BillLine {
        id: BillLineId::from_uuid(row.bill_item_id),
        bill_id: BillId::from_uuid(row.bill_id),
        item_id: ItemId::from_uuid(row.item_id),
        item_name: row.item_name,
        description: row.description,
        quantity: row.quantity,
        unit_price: Money::new(row.unit_price, currency),
        total_price: Money::new(row.total_price, currency),
        created_at: row.created_at,
    }
}

fn line_to_row(line: &BillLine) -> BillLineRow {
    BillLineRow {
        bill_item_id: line.id.into(),
        bill_id: line.bill_id.into(),
        item_id: line.item_id.into(),
        item_name: line.item_name.clone(),
        description: line.description.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price.amount(),
        total_price: line.total_price.amount(),
        created_at: line.created_at,
    }
}

fn row_to_payment(row: PaymentRow, currency: Currency) -> Payment {
    Payment {
        id: PaymentId::from_uuid(row.payment_id),
        bill_id: BillId::from_uuid(row.bill_id),
        amount: Money::new(row.amount, currency),
        payment_date: row.payment_date,
        method: db_to_domain_method(row.payment_method),
        reference: row.reference,
        notes: row.notes,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
    }
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        payment_id: payment.id.into(),
        bill_id: payment.bill_id.into(),
        amount: payment.amount.amount(),
        payment_date: payment.payment_date,
        payment_method: domain_to_db_method(payment.method),
        reference: payment.reference.clone(),
        notes: payment.notes.clone(),
        created_by: payment.created_by.into(),
        created_at: payment.created_at,
    }
}

fn row_to_summary(row: BillSummaryRow) -> Result<BillSummary, PortError> {
    let currency = parse_currency(&row.currency)?;

    Ok(BillSummary {
        bill_date: row.bill_date,
        status: db_to_domain_status(row.status),
        total_amount: Money::new(row.total_amount, currency),
        paid_amount: Money::new(row.paid_amount, currency),
        balance: Money::new(row.balance, currency),
    })
}

fn domain_to_db_status(status: BillStatus) -> DbBillStatus {
    match status {
        BillStatus::Draft => DbBillStatus::Draft,
        BillStatus::Sent => DbBillStatus::Sent,
        BillStatus::Paid => DbBillStatus::Paid,
        BillStatus::Overdue => DbBillStatus::Overdue,
        BillStatus::Cancelled => DbBillStatus::Cancelled,
    }
}

fn db_to_domain_status(status: DbBillStatus) -> BillStatus {
    match status {
        DbBillStatus::Draft => BillStatus::Draft,
        DbBillStatus::Sent => BillStatus::Sent,
        DbBillStatus::Paid => BillStatus::Paid,
        DbBillStatus::Overdue => BillStatus::Overdue,
        DbBillStatus::Cancelled => BillStatus::Cancelled,
    }
}

fn domain_to_db_method(method: PaymentMethod) -> DbPaymentMethod {
    match method {
        PaymentMethod::Cash => DbPaymentMethod::Cash,
        PaymentMethod::Card => DbPaymentMethod::Card,
        PaymentMethod::BankTransfer => DbPaymentMethod::BankTransfer,
        PaymentMethod::Check => DbPaymentMethod::Check,
        PaymentMethod::Other => DbPaymentMethod::Other,
    }
}

fn db_to_domain_method(method: DbPaymentMethod) -> PaymentMethod {
    match method {
        DbPaymentMethod::Cash => PaymentMethod::Cash,
        DbPaymentMethod::Card => PaymentMethod::Card,
        DbPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        DbPaymentMethod::Check => PaymentMethod::Check,
        DbPaymentMethod::Other => PaymentMethod::Other,
    }
}
