//! Payment recording

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{parse_calendar_date, BillId, Currency, Money, ShopId, UserId};

use crate::bill::Bill;
use crate::error::BillingError;
use crate::ledger::{apply_payment, LedgerUpdate};
use crate::payment::Payment;
use crate::request::PaymentRequest;
use crate::service::BillingService;

/// Outcome of recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub ledger: LedgerUpdate,
}

impl BillingService {
    /// Records a payment and updates the bill's ledger
    ///
    /// Accepted for any non-deleted bill. The payment insert and the ledger
    /// update commit together.
    #[instrument(skip(self, request), fields(%shop_id, %user_id))]
    pub async fn add_payment(
        &self,
        bill_id: BillId,
        shop_id: ShopId,
        user_id: UserId,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, BillingError> {
        self.guard.check_access(shop_id, user_id).await?;

        let mut tx = self.store.begin().await?;
        let bill = tx
            .find_bill(shop_id, bill_id)
            .await?
            .ok_or(BillingError::BillNotFound(bill_id))?;

        let (payment_date, amount) = match validated_payment(&request, bill.currency) {
            Ok(parsed) => parsed,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        let now = self.clock.now();
        let ledger = apply_payment(&bill, &amount, now)?;

        let payment = Payment::new(bill.id, amount, payment_date, request.payment_method, user_id, now)
            .with_reference(request.reference)
            .with_notes(request.notes);

        let updated = Bill {
            paid_amount: ledger.paid_amount,
            balance: ledger.balance,
            pending_amount: ledger.balance,
            status: ledger.status,
            updated_at: now,
            ..bill
        };

        tx.insert_payment(&payment).await?;
        tx.update_bill(&updated).await?;
        tx.commit().await?;

        info!(
            %bill_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            balance = %ledger.balance,
            status = %ledger.status,
            "payment recorded"
        );
        Ok(PaymentReceipt { payment, ledger })
    }
}

/// Parses the payment date and the amount at stored precision
///
/// An amount that rounds to zero is rejected like any non-positive one.
fn validated_payment(
    request: &PaymentRequest,
    currency: Currency,
) -> Result<(NaiveDate, Money), BillingError> {
    request.validate()?;
    let payment_date = parse_calendar_date("payment_date", &request.payment_date)?;

    let amount = Money::new(request.amount, currency);
    if !amount.is_positive() {
        return Err(BillingError::invalid_input(
            "payment amount rounds to 0 at 4 decimal places",
        ));
    }
    Ok((payment_date, amount))
}
