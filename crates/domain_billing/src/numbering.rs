//! Bill number allocation
//!
//! Numbers look like `BILL-2024-000042`: a configurable prefix, the year and
//! a six-digit sequence derived from the shop's live bill count. The count
//! ignores soft-deleted bills while the unique constraint does not, so a
//! candidate can collide with a deleted bill or with another shop's bill;
//! the allocator then moves past it.

use tracing::{debug, warn};

use core_kernel::ShopId;

use crate::error::BillingError;
use crate::ports::BillingTransaction;

/// Formats a bill number
pub fn format_bill_number(prefix: &str, year: i32, sequence: u64) -> String {
    format!("{}-{}-{:06}", prefix, year, sequence)
}

/// Allocates bill numbers inside a billing transaction
#[derive(Debug, Clone)]
pub struct BillNumberAllocator {
    prefix: String,
    max_attempts: u32,
}

impl BillNumberAllocator {
    pub fn new(prefix: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            prefix: prefix.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the first free candidate for `shop_id` in `year`
    ///
    /// Each attempt re-reads the live count and never proposes a sequence
    /// at or below the previous candidate, so the loop always advances.
    /// Fails with `AllocationExhausted` after `max_attempts` collisions.
    pub async fn allocate(
        &self,
        tx: &mut dyn BillingTransaction,
        shop_id: ShopId,
        year: i32,
    ) -> Result<String, BillingError> {
        let mut previous: u64 = 0;

        for attempt in 1..=self.max_attempts {
            let count = tx.count_bills(shop_id).await?;
            let sequence = (count + 1).max(previous + 1);
            let candidate = format_bill_number(&self.prefix, year, sequence);

            if !tx.bill_number_exists(&candidate).await? {
                debug!(%shop_id, bill_number = %candidate, attempt, "allocated bill number");
                return Ok(candidate);
            }

            warn!(%shop_id, bill_number = %candidate, attempt, "bill number taken, retrying");
            previous = sequence;
        }

        Err(BillingError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryBillingStore;
    use crate::ports::BillingStore;

    #[test]
    fn test_format() {
        assert_eq!(format_bill_number("BILL", 2024, 1), "BILL-2024-000001");
        assert_eq!(format_bill_number("INV", 2025, 1234567), "INV-2025-1234567");
    }

    #[tokio::test]
    async fn test_first_number_for_empty_shop() {
        let store = InMemoryBillingStore::new();
        let mut tx = store.begin().await.unwrap();

        let allocator = BillNumberAllocator::new("BILL", 10);
        let number = allocator.allocate(tx.as_mut(), ShopId::new(), 2024).await.unwrap();
        assert_eq!(number, "BILL-2024-000001");
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(BillNumberAllocator::new("BILL", 0).max_attempts(), 1);
    }
}
