//! Custom Test Assertions
//!
//! Assertion helpers for bills and money that report the offending values.

use core_kernel::Money;
use domain_billing::{Bill, BillStatus};
use rust_decimal::Decimal;

/// Asserts that a Money value has the expected amount, ignoring scale
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount().normalize(),
        expected.normalize(),
        "Money mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that every ledger field of a bill agrees with its lines and payments
///
/// Checks line totals, subtotal, total floored at zero, balance and its
/// pending mirror. Payments are only summed when the bill was loaded with
/// them.
pub fn assert_ledger_consistent(bill: &Bill) {
    let currency = bill.currency;

    for line in &bill.lines {
        assert_eq!(
            line.total_price.amount(),
            (line.unit_price.amount() * line.quantity).round_dp(4),
            "Line {} total {} != quantity {} x unit price {}",
            line.item_name,
            line.total_price,
            line.quantity,
            line.unit_price
        );
    }

    let subtotal: Decimal = bill.lines.iter().map(|l| l.total_price.amount()).sum();
    assert_eq!(
        bill.subtotal.amount(),
        subtotal,
        "Subtotal {} != sum of lines {}",
        bill.subtotal,
        subtotal
    );

    let gross = bill.subtotal.amount() + bill.tax_amount.amount() - bill.discount_amount.amount();
    assert_eq!(
        bill.total_amount.amount(),
        gross.max(Decimal::ZERO),
        "Total {} != max(0, subtotal + tax - discount)",
        bill.total_amount
    );

    assert_eq!(
        bill.balance.amount(),
        bill.total_amount.amount() - bill.paid_amount.amount(),
        "Balance {} != total {} - paid {}",
        bill.balance,
        bill.total_amount,
        bill.paid_amount
    );
    assert_eq!(bill.pending_amount, bill.balance, "pending_amount must mirror balance");

    if !bill.payments.is_empty() {
        let paid: Decimal = bill.payments.iter().map(|p| p.amount.amount()).sum();
        assert_eq!(
            bill.paid_amount.amount(),
            paid,
            "Paid {} != sum of payments {}",
            bill.paid_amount,
            paid
        );
    }

    for money in [
        &bill.subtotal,
        &bill.tax_amount,
        &bill.discount_amount,
        &bill.total_amount,
        &bill.paid_amount,
        &bill.balance,
    ] {
        assert_eq!(money.currency(), currency, "Ledger field {} not in {}", money, currency);
    }
}

/// Asserts the status a payment should have produced for the bill's balance
pub fn assert_settled(bill: &Bill) {
    assert!(
        !bill.balance.is_positive(),
        "Bill {} still has balance {}",
        bill.bill_number,
        bill.balance
    );
    assert_eq!(bill.status, BillStatus::Paid, "Bill {} not marked paid", bill.bill_number);
}
