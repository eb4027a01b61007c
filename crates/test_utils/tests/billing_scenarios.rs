//! End-to-end billing scenarios on the in-memory adapters

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use core_kernel::{BillId, Clock, CustomerId, ItemId, Money, PortError};
use domain_billing::{
    BillFilter, BillStatus, BillingError, BillingSettings, FailurePoint, PaymentMethod,
};
use rust_decimal_macros::dec;
use test_utils::{
    assert_ledger_consistent, assert_money_eq, assert_settled, reference_date, BillRequestBuilder,
    BillingWorld, PaymentRequestBuilder,
};

/// Three widgets at 100 with 10% tax and 20 off
fn reference_request(world: &BillingWorld) -> BillRequestBuilder {
    BillRequestBuilder::new()
        .customer(world.customer.id)
        .line(world.item.id, dec!(3), dec!(100))
        .tax_rate(dec!(10))
        .discount(dec!(20))
}

mod create {
    use super::*;

    #[tokio::test]
    async fn reference_bill_totals_and_stock() {
        let world = BillingWorld::new().await;

        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_money_eq(&bill.subtotal, dec!(300));
        assert_money_eq(&bill.tax_amount, dec!(30));
        assert_money_eq(&bill.discount_amount, dec!(20));
        assert_money_eq(&bill.total_amount, dec!(310));
        assert_money_eq(&bill.balance, dec!(310));
        assert_money_eq(&bill.paid_amount, dec!(0));
        assert_eq!(bill.status, BillStatus::Draft);
        assert_eq!(world.stock().await, dec!(7));
        assert_ledger_consistent(&bill);
    }

    #[tokio::test]
    async fn bill_is_hydrated_with_customer_and_lines() {
        let world = BillingWorld::new().await;

        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_eq!(bill.customer.as_ref().map(|c| c.id), Some(world.customer.id));
        assert_eq!(bill.lines.len(), 1);
        assert_eq!(bill.lines[0].item_name, "Widget");
        assert!(bill.payments.is_empty());
        assert_eq!(bill.created_by, world.member);
    }

    #[tokio::test]
    async fn discount_beyond_total_floors_at_zero() {
        let world = BillingWorld::new().await;
        let request = BillRequestBuilder::new()
            .line(world.item.id, dec!(1), dec!(100))
            .discount(dec!(500))
            .build();

        let bill = world.billing.create_bill(world.shop, world.member, request).await.unwrap();

        assert!(bill.total_amount.is_zero());
        assert!(bill.balance.is_zero());
        assert_eq!(bill.status, BillStatus::Draft);
    }

    #[tokio::test]
    async fn stock_may_go_negative() {
        let world = BillingWorld::new().await;
        let request = BillRequestBuilder::new()
            .line(world.item.id, dec!(12), dec!(100))
            .build();

        world.billing.create_bill(world.shop, world.member, request).await.unwrap();

        assert_eq!(world.stock().await, dec!(-2));
    }

    #[tokio::test]
    async fn blank_due_date_means_none() {
        let world = BillingWorld::new().await;
        let request = reference_request(&world).due_date_text("  ").build();

        let bill = world.billing.create_bill(world.shop, world.member, request).await.unwrap();

        assert_eq!(bill.due_date, None);
    }

    #[tokio::test]
    async fn malformed_due_date_is_rejected() {
        let world = BillingWorld::new().await;
        let request = reference_request(&world).due_date_text("2024-13-01").build();

        let err = world
            .billing
            .create_bill(world.shop, world.member, request)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidDate { ref field, .. } if field == "due_date"));
        assert_eq!(world.stock().await, dec!(10));
    }

    #[tokio::test]
    async fn unknown_customer_is_rejected() {
        let world = BillingWorld::new().await;
        let request = reference_request(&world).customer(CustomerId::new()).build();

        let err = world
            .billing
            .create_bill(world.shop, world.member, request)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::CustomerNotFound(_)));
        assert_eq!(world.stock().await, dec!(10));
    }

    #[tokio::test]
    async fn item_from_another_shop_is_not_found() {
        let world = BillingWorld::new().await;
        let (other_shop, other_user) = world.second_shop().await;
        let request = BillRequestBuilder::new()
            .line(world.item.id, dec!(1), dec!(100))
            .build();

        let err = world
            .billing
            .create_bill(other_shop, other_user, request)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::ItemNotFound(id) if id == world.item.id));
        assert_eq!(world.stock().await, dec!(10));
    }

    #[tokio::test]
    async fn empty_bill_is_invalid_input() {
        let world = BillingWorld::new().await;

        let err = world
            .billing
            .create_bill(world.shop, world.member, BillRequestBuilder::new().build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidInput(_)));
    }
}

mod numbering {
    use super::*;

    #[tokio::test]
    async fn numbers_follow_the_shop_sequence() {
        let world = BillingWorld::new().await;

        let first = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        let second = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_eq!(first.bill_number, "BILL-2024-000001");
        assert_eq!(second.bill_number, "BILL-2024-000002");
    }

    #[tokio::test]
    async fn soft_deleted_numbers_are_not_reused() {
        let world = BillingWorld::new().await;
        let first = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        let second = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        world.billing.delete_bill(first.id, world.shop, world.member).await.unwrap();

        // Live count is 1 again, so the first candidate collides with bill 2
        let third = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_ne!(third.bill_number, first.bill_number);
        assert_ne!(third.bill_number, second.bill_number);
        assert_eq!(third.bill_number, "BILL-2024-000003");
    }

    #[tokio::test]
    async fn numbers_are_unique_across_shops() {
        let world = BillingWorld::new().await;
        let (other_shop, other_user) = world.second_shop().await;
        let mine = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let other_item = world
            .catalog
            .bulk_create_items(
                other_shop,
                other_user,
                vec![test_utils::ItemRequestBuilder::new("Gadget").price(dec!(5)).build()],
            )
            .await
            .unwrap()
            .remove(0);
        let theirs = world
            .billing
            .create_bill(
                other_shop,
                other_user,
                BillRequestBuilder::new().line(other_item.id, dec!(1), dec!(5)).build(),
            )
            .await
            .unwrap();

        assert_eq!(mine.bill_number, "BILL-2024-000001");
        assert_eq!(theirs.bill_number, "BILL-2024-000002");
    }

    #[tokio::test]
    async fn year_comes_from_the_clock() {
        let world = BillingWorld::new().await;
        world.clock.set(
            NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
                .and_utc(),
        );

        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        // The bill date stays what the request says
        assert_eq!(bill.bill_number, "BILL-2025-000001");
        assert_eq!(bill.bill_date, reference_date());
    }

    #[tokio::test]
    async fn configured_prefix_is_used() {
        let world = BillingWorld::with_settings(BillingSettings {
            bill_number_prefix: "INV".to_string(),
            ..Default::default()
        })
        .await;

        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_eq!(bill.bill_number, "INV-2024-000001");
    }

    #[tokio::test]
    async fn insert_conflict_restarts_the_transaction() {
        let world = BillingWorld::new().await;
        world.store.conflict_once(FailurePoint::InsertBill);

        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        assert_eq!(bill.bill_number, "BILL-2024-000001");
        // Only the successful attempt drew down stock
        assert_eq!(world.stock().await, dec!(7));
    }

    #[tokio::test]
    async fn repeated_conflicts_exhaust_the_budget() {
        let world = BillingWorld::with_settings(BillingSettings {
            max_allocation_attempts: 2,
            ..Default::default()
        })
        .await;
        world.store.conflict_once(FailurePoint::InsertBill);
        world.store.conflict_once(FailurePoint::InsertBill);

        let err = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::AllocationExhausted { attempts: 2 }));
        assert_eq!(world.stock().await, dec!(10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_numbers() {
        let world = Arc::new(BillingWorld::new().await);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let world = world.clone();
            tasks.spawn(async move {
                let request = BillRequestBuilder::new()
                    .line(world.item.id, dec!(1), dec!(100))
                    .build();
                world.billing.create_bill(world.shop, world.member, request).await
            });
        }

        let mut numbers = Vec::new();
        while let Some(result) = tasks.join_next().await {
            numbers.push(result.unwrap().unwrap().bill_number);
        }
        numbers.sort();
        numbers.dedup();

        assert_eq!(numbers.len(), 8);
        assert_eq!(world.stock().await, dec!(2));
    }
}

mod payments {
    use super::*;

    #[tokio::test]
    async fn paying_the_exact_balance_settles_the_bill() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let receipt = world
            .billing
            .add_payment(
                bill.id,
                world.shop,
                world.member,
                PaymentRequestBuilder::new(dec!(310)).method(PaymentMethod::Cash).build(),
            )
            .await
            .unwrap();

        assert_money_eq(&receipt.ledger.paid_amount, dec!(310));
        assert!(receipt.ledger.balance.is_zero());
        assert_eq!(receipt.ledger.status, BillStatus::Paid);

        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_settled(&stored);
        assert_eq!(stored.payments.len(), 1);
        assert_eq!(stored.payments[0].method, PaymentMethod::Cash);
        assert_ledger_consistent(&stored);
    }

    #[tokio::test]
    async fn partial_payment_marks_bill_sent() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                reference_request(&world)
                    .due_date(reference_date() + Duration::days(30))
                    .build(),
            )
            .await
            .unwrap();

        let receipt = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(100)).build())
            .await
            .unwrap();

        assert_eq!(receipt.ledger.status, BillStatus::Sent);
        assert_money_eq(&receipt.ledger.balance, dec!(210));
    }

    #[tokio::test]
    async fn partial_payment_past_due_date_marks_bill_overdue() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                reference_request(&world)
                    .due_date(reference_date() - Duration::days(5))
                    .build(),
            )
            .await
            .unwrap();

        let receipt = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(100)).build())
            .await
            .unwrap();

        assert_eq!(receipt.ledger.status, BillStatus::Overdue);
        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_eq!(stored.status, BillStatus::Overdue);
        assert_money_eq(&stored.balance, dec!(210));
    }

    #[tokio::test]
    async fn due_today_is_overdue() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                reference_request(&world).due_date(reference_date()).build(),
            )
            .await
            .unwrap();

        let receipt = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(10)).build())
            .await
            .unwrap();

        assert_eq!(receipt.ledger.status, BillStatus::Overdue);
        let stored = world.store.stored_bill(bill.id).await.unwrap();
        assert_eq!(stored.status, BillStatus::Overdue);
    }

    #[tokio::test]
    async fn payment_is_stamped_with_the_clock() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let receipt = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(10)).build())
            .await
            .unwrap();

        assert_eq!(receipt.payment.created_at, world.clock.now());
        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_eq!(stored.payments[0].created_at, world.clock.now());
        assert!(stored.lines.iter().all(|line| line.created_at == stored.created_at));
    }

    #[tokio::test]
    async fn payments_accumulate_and_overpayment_goes_negative() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        for amount in [dec!(100), dec!(200), dec!(50)] {
            world
                .billing
                .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(amount).build())
                .await
                .unwrap();
        }

        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_money_eq(&stored.paid_amount, dec!(350));
        assert_money_eq(&stored.balance, dec!(-40));
        assert_eq!(stored.status, BillStatus::Paid);
        assert_eq!(stored.payments.len(), 3);
        assert_ledger_consistent(&stored);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let err = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(0)).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn amount_below_stored_precision_is_rejected() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let err = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(0.00001)).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidInput(_)));
        assert_eq!(world.store.rollbacks(), 1);
        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_eq!(stored.status, BillStatus::Draft);
        assert!(stored.payments.is_empty());
        assert!(stored.paid_amount.is_zero());
    }

    #[tokio::test]
    async fn malformed_payment_date_is_rejected() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let err = world
            .billing
            .add_payment(
                bill.id,
                world.shop,
                world.member,
                PaymentRequestBuilder::new(dec!(10)).payment_date_text("yesterday").build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidDate { ref field, .. } if field == "payment_date"));
        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert!(stored.payments.is_empty());
    }

    #[tokio::test]
    async fn payment_on_missing_bill_is_not_found() {
        let world = BillingWorld::new().await;

        let err = world
            .billing
            .add_payment(BillId::new(), world.shop, world.member, PaymentRequestBuilder::new(dec!(10)).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::BillNotFound(_)));
    }

    #[tokio::test]
    async fn failed_header_update_drops_the_payment() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        world.store.fail_once(FailurePoint::UpdateBill);

        let err = world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(10)).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Store(PortError::Internal { .. })));
        let stored = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert!(stored.payments.is_empty());
        assert!(stored.paid_amount.is_zero());
        assert_eq!(stored.status, BillStatus::Draft);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn draft_update_recomputes_totals() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let updated = world
            .billing
            .update_bill(
                bill.id,
                world.shop,
                world.member,
                BillRequestBuilder::new()
                    .line(world.item.id, dec!(1), dec!(50))
                    .line(world.item.id, dec!(2), dec!(25))
                    .notes("revised")
                    .build(),
            )
            .await
            .unwrap();

        assert_money_eq(&updated.subtotal, dec!(100));
        assert_money_eq(&updated.total_amount, dec!(100));
        assert_money_eq(&updated.balance, dec!(100));
        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.bill_number, bill.bill_number);
        assert_eq!(updated.notes.as_deref(), Some("revised"));
        assert_eq!(updated.customer_id, None);
        assert_ledger_consistent(&updated);
        // Updates never touch stock
        assert_eq!(world.stock().await, dec!(7));
    }

    #[tokio::test]
    async fn update_rejected_once_bill_is_sent() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(10)).build())
            .await
            .unwrap();
        let before = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_eq!(before.status, BillStatus::Sent);

        let err = world
            .billing
            .update_bill(
                bill.id,
                world.shop,
                world.member,
                BillRequestBuilder::new().line(world.item.id, dec!(1), dec!(1)).build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidState(_)));
        let after = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn update_rejected_once_bill_is_paid() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(310)).build())
            .await
            .unwrap();
        let before = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap();

        let err = world
            .billing
            .update_bill(bill.id, world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvalidState(_)));
        assert_eq!(world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_hides_the_bill() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        world.billing.delete_bill(bill.id, world.shop, world.member).await.unwrap();

        let err = world.billing.get_bill(bill.id, world.shop, world.member).await.unwrap_err();
        assert!(matches!(err, BillingError::BillNotFound(id) if id == bill.id));
        assert!(world.store.stored_bill(bill.id).await.unwrap().is_deleted());
        // Stock is not restored
        assert_eq!(world.stock().await, dec!(7));

        let again = world.billing.delete_bill(bill.id, world.shop, world.member).await.unwrap_err();
        assert!(matches!(again, BillingError::BillNotFound(_)));
    }

    #[tokio::test]
    async fn delete_rejected_for_paid_bill() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        world
            .billing
            .add_payment(bill.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(310)).build())
            .await
            .unwrap();

        let err = world.billing.delete_bill(bill.id, world.shop, world.member).await.unwrap_err();

        assert!(matches!(err, BillingError::InvalidState(_)));
        assert!(world.billing.get_bill(bill.id, world.shop, world.member).await.is_ok());
    }

    #[tokio::test]
    async fn bill_of_another_shop_is_not_found() {
        let world = BillingWorld::new().await;
        let (other_shop, other_user) = world.second_shop().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let err = world.billing.get_bill(bill.id, other_shop, other_user).await.unwrap_err();

        assert!(matches!(err, BillingError::BillNotFound(_)));
    }

    #[tokio::test]
    async fn failed_stock_adjustment_rolls_back_the_bill() {
        let world = BillingWorld::new().await;
        world.store.fail_once(FailurePoint::AdjustItemQuantity);

        let err = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Store(_)));
        assert_eq!(world.stock().await, dec!(10));
        let bills = world
            .billing
            .get_bills(world.shop, world.member, BillFilter::default())
            .await
            .unwrap();
        assert!(bills.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_leaves_nothing_behind() {
        let world = BillingWorld::new().await;
        world.store.fail_once(FailurePoint::Commit);

        let result = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await;

        assert!(result.is_err());
        assert_eq!(world.stock().await, dec!(10));
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn newest_first_with_filters() {
        let world = BillingWorld::new().await;
        let first = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                reference_request(&world).notes("Spring order").build(),
            )
            .await
            .unwrap();
        let second = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                BillRequestBuilder::new()
                    .line(world.item.id, dec!(1), dec!(10))
                    .bill_date(reference_date() - Duration::days(40))
                    .build(),
            )
            .await
            .unwrap();

        let all = world
            .billing
            .get_bills(world.shop, world.member, BillFilter::default())
            .await
            .unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let by_notes = world
            .billing
            .get_bills(world.shop, world.member, BillFilter::search("spring"))
            .await
            .unwrap();
        assert_eq!(by_notes.len(), 1);
        assert_eq!(by_notes[0].id, first.id);

        let by_number = world
            .billing
            .get_bills(world.shop, world.member, BillFilter::search("000002"))
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].id, second.id);

        let by_customer = world
            .billing
            .get_bills(
                world.shop,
                world.member,
                BillFilter::default().with_customer(world.customer.id),
            )
            .await
            .unwrap();
        assert_eq!(by_customer.len(), 1);

        let in_may = world
            .billing
            .get_bills(
                world.shop,
                world.member,
                BillFilter::default().between(
                    NaiveDate::from_ymd_opt(2024, 5, 1),
                    NaiveDate::from_ymd_opt(2024, 5, 31),
                ),
            )
            .await
            .unwrap();
        assert_eq!(in_may.len(), 1);
        assert_eq!(in_may[0].id, first.id);

        let paid = world
            .billing
            .get_bills(
                world.shop,
                world.member,
                BillFilter::default().with_status(BillStatus::Paid),
            )
            .await
            .unwrap();
        assert!(paid.is_empty());
    }

    #[tokio::test]
    async fn bill_with_missing_customer_is_skipped() {
        let world = BillingWorld::new().await;
        let orphan = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        let walk_in = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                BillRequestBuilder::new().line(world.item.id, dec!(1), dec!(100)).build(),
            )
            .await
            .unwrap();
        world.store.remove_customer(world.customer.id).await;

        let bills = world
            .billing
            .get_bills(world.shop, world.member, BillFilter::default())
            .await
            .unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].id, walk_in.id);
        assert!(world.billing.get_bill(orphan.id, world.shop, world.member).await.is_err());
    }

    #[tokio::test]
    async fn other_shops_bills_are_invisible() {
        let world = BillingWorld::new().await;
        let (other_shop, other_user) = world.second_shop().await;
        world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();

        let bills = world
            .billing
            .get_bills(other_shop, other_user, BillFilter::default())
            .await
            .unwrap();

        assert!(bills.is_empty());
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn outsider_is_denied_everywhere() {
        let world = BillingWorld::new().await;
        let bill = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap();
        let denied = |err: BillingError| matches!(err, BillingError::AccessDenied { .. });

        let create = world
            .billing
            .create_bill(world.shop, world.outsider, reference_request(&world).build())
            .await
            .unwrap_err();
        let list = world
            .billing
            .get_bills(world.shop, world.outsider, BillFilter::default())
            .await
            .unwrap_err();
        let read = world.billing.get_bill(bill.id, world.shop, world.outsider).await.unwrap_err();
        let update = world
            .billing
            .update_bill(bill.id, world.shop, world.outsider, reference_request(&world).build())
            .await
            .unwrap_err();
        let delete = world.billing.delete_bill(bill.id, world.shop, world.outsider).await.unwrap_err();
        let pay = world
            .billing
            .add_payment(bill.id, world.shop, world.outsider, PaymentRequestBuilder::new(dec!(1)).build())
            .await
            .unwrap_err();
        let stats = world.billing.bill_stats(world.shop, world.outsider).await.unwrap_err();

        for err in [create, list, read, update, delete, pay, stats] {
            assert!(denied(err));
        }
        assert_eq!(world.stock().await, dec!(7));
    }

    #[tokio::test]
    async fn revoked_member_is_denied() {
        let world = BillingWorld::new().await;
        world.memberships.revoke(world.shop, world.member).await;

        let err = world
            .billing
            .create_bill(world.shop, world.member, reference_request(&world).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn access_is_checked_before_the_bill_lookup() {
        let world = BillingWorld::new().await;

        let err = world
            .billing
            .add_payment(BillId::new(), world.shop, world.outsider, PaymentRequestBuilder::new(dec!(1)).build())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::AccessDenied { .. }));
    }
}

mod stats {
    use super::*;

    #[tokio::test]
    async fn stats_aggregate_the_shop_ledger() {
        let world = BillingWorld::new().await;
        let overdue = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                reference_request(&world)
                    .due_date(reference_date() - Duration::days(1))
                    .build(),
            )
            .await
            .unwrap();
        world
            .billing
            .add_payment(overdue.id, world.shop, world.member, PaymentRequestBuilder::new(dec!(100)).build())
            .await
            .unwrap();
        world
            .billing
            .create_bill(
                world.shop,
                world.member,
                BillRequestBuilder::new()
                    .line(world.item.id, dec!(1), dec!(50))
                    .bill_date(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap())
                    .build(),
            )
            .await
            .unwrap();
        let deleted = world
            .billing
            .create_bill(
                world.shop,
                world.member,
                BillRequestBuilder::new().line(world.item.id, dec!(1), dec!(999)).build(),
            )
            .await
            .unwrap();
        world.billing.delete_bill(deleted.id, world.shop, world.member).await.unwrap();

        let stats = world.billing.bill_stats(world.shop, world.member).await.unwrap();

        assert_eq!(stats.total_bills, 2);
        assert_money_eq(&stats.total_amount, dec!(360));
        assert_money_eq(&stats.paid_amount, dec!(100));
        assert_money_eq(&stats.outstanding_amount, dec!(260));
        assert_money_eq(&stats.overdue_amount, dec!(210));
        assert_eq!(stats.this_month_bills, 1);
        assert_money_eq(&stats.this_month_amount, dec!(310));
    }

    #[tokio::test]
    async fn empty_shop_has_zero_stats() {
        let world = BillingWorld::new().await;

        let stats = world.billing.bill_stats(world.shop, world.member).await.unwrap();

        assert_eq!(stats.total_bills, 0);
        assert_eq!(stats.total_amount, Money::zero(world.billing.settings().currency));
    }
}

#[tokio::test]
async fn unknown_item_lists_the_offending_id() {
    let world = BillingWorld::new().await;
    let missing = ItemId::new();

    let err = world
        .billing
        .create_bill(
            world.shop,
            world.member,
            BillRequestBuilder::new().line(missing, dec!(1), dec!(1)).build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::ItemNotFound(id) if id == missing));
}
