//! Bill statistics
//!
//! Roll-up of the ledger columns of a shop's live bills.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{first_day_of_month, Currency, Money, MoneyError, ShopId, UserId};

use crate::bill::BillStatus;
use crate::error::BillingError;
use crate::ports::BillSummary;
use crate::service::BillingService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillStats {
    pub total_bills: u64,
    pub total_amount: Money,
    pub paid_amount: Money,
    /// Σ balance; overpaid bills pull it down
    pub outstanding_amount: Money,
    /// Σ balance of bills in `Overdue`
    pub overdue_amount: Money,
    pub this_month_bills: u64,
    pub this_month_amount: Money,
}

impl BillStats {
    /// Aggregates summaries; "this month" means `bill_date >= month_start`
    pub fn from_summaries(
        currency: Currency,
        summaries: &[BillSummary],
        month_start: NaiveDate,
    ) -> Result<Self, MoneyError> {
        let mut stats = BillStats {
            total_bills: 0,
            total_amount: Money::zero(currency),
            paid_amount: Money::zero(currency),
            outstanding_amount: Money::zero(currency),
            overdue_amount: Money::zero(currency),
            this_month_bills: 0,
            this_month_amount: Money::zero(currency),
        };

        for summary in summaries {
            stats.total_bills += 1;
            stats.total_amount = stats.total_amount.checked_add(&summary.total_amount)?;
            stats.paid_amount = stats.paid_amount.checked_add(&summary.paid_amount)?;
            stats.outstanding_amount = stats.outstanding_amount.checked_add(&summary.balance)?;
            if summary.status == BillStatus::Overdue {
                stats.overdue_amount = stats.overdue_amount.checked_add(&summary.balance)?;
            }
            if summary.bill_date >= month_start {
                stats.this_month_bills += 1;
                stats.this_month_amount = stats.this_month_amount.checked_add(&summary.total_amount)?;
            }
        }

        Ok(stats)
    }
}

impl BillingService {
    #[instrument(skip(self), fields(%shop_id, %user_id))]
    pub async fn bill_stats(&self, shop_id: ShopId, user_id: UserId) -> Result<BillStats, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;

        let summaries = self.store.bill_summaries(shop_id).await?;
        let month_start = first_day_of_month(self.clock.today());
        Ok(BillStats::from_summaries(self.settings.currency, &summaries, month_start)?)
    }
}
