//! Billing repository implementation
//!
//! SQL for bills, bill lines and payments. Functions that take a
//! `&mut PgConnection` run on whatever connection the caller holds, which
//! lets the same statements serve both pooled reads and the billing
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

const BILL_COLUMNS: &str = r#"
    bill_id, shop_id, customer_id, bill_number, bill_date, due_date, currency,
    subtotal, tax_amount, discount_amount, total_amount, paid_amount, balance,
    pending_amount, status, notes, payment_terms, created_by, created_at,
    updated_at, deleted_at
"#;

/// Repository for bills and their lines and payments
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of non-deleted bills in a shop
    pub async fn count_live_bills(
        conn: &mut PgConnection,
        shop_id: Uuid,
    ) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bills WHERE shop_id = $1 AND deleted_at IS NULL",
        )
        .bind(shop_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// Checks the global bill number space, soft-deleted bills included
    pub async fn bill_number_exists(
        conn: &mut PgConnection,
        bill_number: &str,
    ) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bills WHERE bill_number = $1)",
        )
        .bind(bill_number)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    /// Fetches a non-deleted bill header
    ///
    /// With `for_update` the row stays locked until the surrounding
    /// transaction ends.
    pub async fn find_bill(
        conn: &mut PgConnection,
        shop_id: Uuid,
        bill_id: Uuid,
        for_update: bool,
    ) -> Result<Option<BillRow>, DatabaseError> {
        let mut sql = format!(
            "SELECT {} FROM bills WHERE bill_id = $1 AND shop_id = $2 AND deleted_at IS NULL",
            BILL_COLUMNS
        );
        if for_update {
            sql.push_str(" FOR UPDATE");
        }

        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill_id)
            .bind(shop_id)
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }

    pub async fn find_lines(
        conn: &mut PgConnection,
        bill_id: Uuid,
    ) -> Result<Vec<BillLineRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillLineRow>(
            r#"
            SELECT bill_item_id, bill_id, item_id, item_name, description,
                   quantity, unit_price, total_price, created_at
            FROM bill_items
            WHERE bill_id = $1
            ORDER BY position
            "#,
        )
        .bind(bill_id)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    pub async fn find_payments(
        conn: &mut PgConnection,
        bill_id: Uuid,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, bill_id, amount, payment_date, payment_method,
                   reference, notes, created_by, created_at
            FROM payments
            WHERE bill_id = $1
            ORDER BY created_at, payment_id
            "#,
        )
        .bind(bill_id)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// Inserts a bill header
    ///
    /// A taken bill number surfaces as `DatabaseError::DuplicateEntry`.
    pub async fn insert_bill(conn: &mut PgConnection, bill: &BillRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                bill_id, shop_id, customer_id, bill_number, bill_date, due_date, currency,
                subtotal, tax_amount, discount_amount, total_amount, paid_amount, balance,
                pending_amount, status, notes, payment_terms, created_by, created_at,
                updated_at, deleted_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(bill.bill_id)
        .bind(bill.shop_id)
        .bind(bill.customer_id)
        .bind(&bill.bill_number)
        .bind(bill.bill_date)
        .bind(bill.due_date)
        .bind(&bill.currency)
        .bind(bill.subtotal)
        .bind(bill.tax_amount)
        .bind(bill.discount_amount)
        .bind(bill.total_amount)
        .bind(bill.paid_amount)
        .bind(bill.balance)
        .bind(bill.pending_amount)
        .bind(bill.status)
        .bind(&bill.notes)
        .bind(&bill.payment_terms)
        .bind(bill.created_by)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .bind(bill.deleted_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Rewrites the mutable header columns of a bill
    pub async fn update_bill(conn: &mut PgConnection, bill: &BillRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE bills SET
                customer_id = $2, bill_date = $3, due_date = $4, subtotal = $5,
                tax_amount = $6, discount_amount = $7, total_amount = $8,
                paid_amount = $9, balance = $10, pending_amount = $11, status = $12,
                notes = $13, payment_terms = $14, updated_at = $15
            WHERE bill_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(bill.bill_id)
        .bind(bill.customer_id)
        .bind(bill.bill_date)
        .bind(bill.due_date)
        .bind(bill.subtotal)
        .bind(bill.tax_amount)
        .bind(bill.discount_amount)
        .bind(bill.total_amount)
        .bind(bill.paid_amount)
        .bind(bill.balance)
        .bind(bill.pending_amount)
        .bind(bill.status)
        .bind(&bill.notes)
        .bind(&bill.payment_terms)
        .bind(bill.updated_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Bill", bill.bill_id));
        }
        Ok(())
    }

    pub async fn delete_lines(conn: &mut PgConnection, bill_id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM bill_items WHERE bill_id = $1")
            .bind(bill_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Inserts lines, numbering their positions in slice order
    pub async fn insert_lines(
        conn: &mut PgConnection,
        lines: &[BillLineRow],
    ) -> Result<(), DatabaseError> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bill_items (
                    bill_item_id, bill_id, item_id, item_name, description, position,
                    quantity, unit_price, total_price, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(line.bill_item_id)
            .bind(line.bill_id)
            .bind(line.item_id)
            .bind(&line.item_name)
            .bind(&line.description)
            .bind(position as i32)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.total_price)
            .bind(line.created_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn insert_payment(
        conn: &mut PgConnection,
        payment: &PaymentRow,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, bill_id, amount, payment_date, payment_method,
                reference, notes, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.payment_id)
        .bind(payment.bill_id)
        .bind(payment.amount)
        .bind(payment.payment_date)
        .bind(payment.payment_method)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.created_by)
        .bind(payment.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn soft_delete_bill(
        conn: &mut PgConnection,
        shop_id: Uuid,
        bill_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE bills SET deleted_at = $3, updated_at = $3
            WHERE bill_id = $1 AND shop_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(bill_id)
        .bind(shop_id)
        .bind(deleted_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Bill", bill_id));
        }
        Ok(())
    }

    /// Ids of non-deleted bills matching the query, newest created first
    pub async fn search_bill_ids(&self, query: &BillQuery) -> Result<Vec<Uuid>, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT bill_id FROM bills WHERE deleted_at IS NULL AND shop_id = ",
        );
        builder.push_bind(query.shop_id);

        if let Some(term) = &query.search {
            let pattern = like_pattern(term);
            builder
                .push(" AND (bill_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR notes ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(customer_id) = query.customer_id {
            builder.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(start) = query.start_date {
            builder.push(" AND bill_date >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            builder.push(" AND bill_date <= ").push_bind(end);
        }
        builder.push(" ORDER BY created_at DESC, bill_id DESC");

        let ids = builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Ledger columns of every non-deleted bill in a shop
    pub async fn summaries(&self, shop_id: Uuid) -> Result<Vec<BillSummaryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillSummaryRow>(
            r#"
            SELECT bill_date, status, currency, total_amount, paid_amount, balance
            FROM bills
            WHERE shop_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcards escaped
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============================================================================
// Database row types
// ============================================================================

/// Bill status as stored in the `bill_status` enum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "bill_status", rename_all = "snake_case")]
pub enum BillStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

/// Payment method as stored in the `payment_method` enum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
    Other,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillRow {
    pub bill_id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub pending_amount: Decimal,
    pub status: BillStatus,
    pub notes: Option<String>,
    pub payment_terms: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillLineRow {
    pub bill_item_id: Uuid,
    pub bill_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub bill_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillSummaryRow {
    pub bill_date: NaiveDate,
    pub status: BillStatus,
    pub currency: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
}

/// Search parameters for bill listings
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    pub shop_id: Uuid,
    pub search: Option<String>,
    pub status: Option<BillStatus>,
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("bill-2024"), "%bill-2024%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
