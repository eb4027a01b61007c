//! Ledger calculator
//!
//! Pure functions that derive a bill's monetary fields. Nothing here reads
//! the clock or touches storage; callers pass `now` explicitly.
//!
//! # Invariants
//!
//! - `total_amount = max(0, subtotal + tax_amount - discount_amount)`
//! - `balance = total_amount - paid_amount`, signed (overpayment goes negative)
//! - `pending_amount == balance`

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{Money, MoneyError, Rate};

use crate::bill::{Bill, BillLine, BillStatus};

/// Totals derived from a set of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

/// Ledger fields that change when a payment is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerUpdate {
    pub paid_amount: Money,
    pub balance: Money,
    pub status: BillStatus,
}

/// Computes subtotal, tax and total for `lines`
///
/// # Arguments
///
/// * `lines` - Bill lines; each contributes `quantity * unit_price`
/// * `tax_rate` - Applied to the subtotal
/// * `discount` - Flat amount taken off after tax; its currency is the bill's
///
/// The total is floored at zero, so a discount larger than the taxed
/// subtotal yields a zero-total bill.
pub fn compute_totals(
    lines: &[BillLine],
    tax_rate: Rate,
    discount: Money,
) -> Result<Totals, MoneyError> {
    let subtotal = Money::sum(discount.currency(), lines.iter().map(|l| &l.total_price))?;
    let tax_amount = tax_rate.apply(&subtotal)?;
    let total_amount = subtotal
        .checked_add(&tax_amount)?
        .checked_sub(&discount)?
        .max_zero();

    debug!(%subtotal, %tax_amount, discount = %discount, %total_amount, "computed bill totals");

    Ok(Totals {
        subtotal,
        tax_amount,
        discount_amount: discount,
        total_amount,
    })
}

/// Applies a payment of `amount` to `bill`
///
/// Status is derived in order: a settled balance is `Paid`; an outstanding
/// balance past `due_date` is `Overdue`; anything else is `Sent`.
pub fn apply_payment(bill: &Bill, amount: &Money, now: DateTime<Utc>) -> Result<LedgerUpdate, MoneyError> {
    let paid_amount = bill.paid_amount.checked_add(amount)?;
    let balance = rebalance(&bill.total_amount, &paid_amount)?;
    Ok(LedgerUpdate {
        paid_amount,
        balance,
        status: derive_status(&balance, bill.due_date, now),
    })
}

/// Status implied by a balance after a payment
///
/// The due date counts from midnight UTC, so a bill is overdue for the
/// whole of its due day.
pub fn derive_status(balance: &Money, due_date: Option<NaiveDate>, now: DateTime<Utc>) -> BillStatus {
    if !balance.is_positive() {
        BillStatus::Paid
    } else if due_date.is_some_and(|due| due.and_time(NaiveTime::MIN).and_utc() < now) {
        BillStatus::Overdue
    } else {
        BillStatus::Sent
    }
}

/// Signed balance for a total and the amount already paid
pub fn rebalance(total: &Money, paid: &Money) -> Result<Money, MoneyError> {
    total.checked_sub(paid)
}
