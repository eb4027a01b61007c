//! Property-Based Test Generators
//!
//! proptest strategies for ledger inputs. Amounts use two decimal places
//! so that expected values can be computed exactly.

use chrono::Utc;
use core_kernel::{BillId, Currency, ItemId, Money};
use domain_billing::BillLine;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for positive unit prices up to 100,000.00
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for positive whole quantities
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100i64).prop_map(Decimal::from)
}

/// Strategy for tax percentages between 0 and 30 with two decimals
pub fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..3_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

/// Strategy for discounts between 0 and 1,000,000.00
pub fn discount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for one to eight (quantity, unit price) pairs
pub fn line_inputs_strategy() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    prop::collection::vec((quantity_strategy(), price_strategy()), 1..8)
}

/// Builds USD bill lines from (quantity, unit price) pairs
pub fn lines_from(inputs: &[(Decimal, Decimal)]) -> Vec<BillLine> {
    let bill_id = BillId::new();
    inputs
        .iter()
        .map(|(quantity, price)| {
            BillLine::new(
                bill_id,
                ItemId::new(),
                "Generated",
                None,
                *quantity,
                Money::new(*price, Currency::USD),
                Utc::now(),
            )
            .unwrap()
        })
        .collect()
}
