//! Inbound payloads for billing operations
//!
//! Dates arrive as `YYYY-MM-DD` strings and are parsed by the service so a
//! malformed date is reported as `InvalidDate` with the offending field.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, ItemId};

use crate::bill::{Bill, BillStatus};
use crate::error::BillingError;
use crate::payment::PaymentMethod;

/// Payload for creating or updating a bill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub bill_date: String,
    /// Blank means no due date
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(alias = "items")]
    pub lines: Vec<BillLineRequest>,
    #[serde(default)]
    pub discount: Decimal,
    /// Percentage applied to the subtotal
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
}

impl BillRequest {
    /// Checks the numeric rules; dates and references are checked by the service
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.lines.is_empty() {
            return Err(BillingError::invalid_input("a bill needs at least one line"));
        }
        for (index, line) in self.lines.iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(BillingError::invalid_input(format!(
                    "line {}: quantity must be greater than 0",
                    index
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(BillingError::invalid_input(format!(
                    "line {}: unit_price cannot be negative",
                    index
                )));
            }
        }
        if self.discount < Decimal::ZERO {
            return Err(BillingError::invalid_input("discount cannot be negative"));
        }
        if self.tax_rate < Decimal::ZERO {
            return Err(BillingError::invalid_input("tax_rate cannot be negative"));
        }
        Ok(())
    }
}

/// One requested line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLineRequest {
    pub item_id: ItemId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub payment_date: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.amount <= Decimal::ZERO {
            return Err(BillingError::invalid_input("payment amount must be greater than 0"));
        }
        Ok(())
    }
}

/// Criteria for listing bills; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillFilter {
    /// Case-insensitive substring of the bill number or notes
    pub search: Option<String>,
    pub status: Option<BillStatus>,
    pub customer_id: Option<CustomerId>,
    /// Inclusive lower bound on `bill_date`
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `bill_date`
    pub end_date: Option<NaiveDate>,
}

impl BillFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: BillStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Drops a blank search term
    pub fn normalized(mut self) -> Self {
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// In-process evaluation, used by adapters without a query engine
    pub fn matches(&self, bill: &Bill) -> bool {
        if let Some(term) = self.search.as_deref() {
            let needle = term.to_lowercase();
            let in_number = bill.bill_number.to_lowercase().contains(&needle);
            let in_notes = bill
                .notes
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !in_number && !in_notes {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != bill.status) {
            return false;
        }
        if self.customer_id.is_some() && self.customer_id != bill.customer_id {
            return false;
        }
        if self.start_date.is_some_and(|start| bill.bill_date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| bill.bill_date > end) {
            return false;
        }
        true
    }
}
