//! Bills and bill lines
//!
//! A bill is the invoice a shop issues to a customer. Its ledger fields
//! (`paid_amount`, `balance`, `pending_amount`, `status`) are materialized
//! from the lines and payments and only ever written by the billing
//! service inside a store transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    BillId, BillLineId, Currency, CustomerId, ItemId, Money, MoneyError, ShopId, UserId,
};
use domain_catalog::Customer;

use crate::payment::Payment;

/// Bill status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Freshly created, still editable
    Draft,
    /// Partially paid and not yet due
    Sent,
    /// Balance settled (or overpaid)
    Paid,
    /// Balance outstanding past the due date
    Overdue,
    /// Voided
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "draft",
            BillStatus::Sent => "sent",
            BillStatus::Paid => "paid",
            BillStatus::Overdue => "overdue",
            BillStatus::Cancelled => "cancelled",
        }
    }

    /// Only drafts may be edited or deleted
    pub fn is_mutable(&self) -> bool {
        matches!(self, BillStatus::Draft)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BillStatus::Draft),
            "sent" => Ok(BillStatus::Sent),
            "paid" => Ok(BillStatus::Paid),
            "overdue" => Ok(BillStatus::Overdue),
            "cancelled" => Ok(BillStatus::Cancelled),
            other => Err(format!("unknown bill status '{}'", other)),
        }
    }
}

/// A bill issued by a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: BillId,
    /// Owning shop
    pub shop_id: ShopId,
    /// Billed customer, if any
    pub customer_id: Option<CustomerId>,
    /// Human-readable number, unique across all shops
    pub bill_number: String,
    /// Date of issue
    pub bill_date: NaiveDate,
    /// Payment due date
    pub due_date: Option<NaiveDate>,
    /// Currency of every monetary field
    pub currency: Currency,
    /// Σ line totals
    pub subtotal: Money,
    /// Tax on the subtotal
    pub tax_amount: Money,
    /// Flat discount
    pub discount_amount: Money,
    /// max(0, subtotal + tax - discount)
    pub total_amount: Money,
    /// Σ payments
    pub paid_amount: Money,
    /// total - paid; negative when overpaid
    pub balance: Money,
    /// Mirrors `balance`
    pub pending_amount: Money,
    /// Lifecycle status
    pub status: BillStatus,
    /// Free-form notes
    pub notes: Option<String>,
    /// Payment terms
    pub terms: Option<String>,
    /// User who created the bill
    pub created_by: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Set when soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
    /// Line items
    pub lines: Vec<BillLine>,
    /// Payments, oldest first
    pub payments: Vec<Payment>,
    /// Hydrated customer record
    pub customer: Option<Customer>,
}

impl Bill {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the header without owned collections or hydration
    pub fn header(&self) -> Bill {
        Bill {
            lines: Vec::new(),
            payments: Vec::new(),
            customer: None,
            ..self.clone()
        }
    }
}

/// One item entry within a bill
///
/// The item's name is copied at billing time so later catalog edits never
/// rewrite an issued bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLine {
    pub id: BillLineId,
    pub bill_id: BillId,
    pub item_id: ItemId,
    pub item_name: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

impl BillLine {
    pub fn new(
        bill_id: BillId,
        item_id: ItemId,
        item_name: impl Into<String>,
        description: Option<String>,
        quantity: Decimal,
        unit_price: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            id: BillLineId::new_v7(),
            bill_id,
            item_id,
            item_name: item_name.into(),
            description,
            quantity,
            total_price: unit_price.checked_mul(quantity)?,
            unit_price,
            created_at,
        })
    }
}
