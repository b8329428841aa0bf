//! Payment tracker lifecycle under a paused clock

use chrono::{NaiveDate, Utc};
use debt_core::{DebtItemId, DebtLineItem, DebtStatus, Error, Metrics};
use payment_engine::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(3000);

fn income_tax() -> DebtLineItem {
    DebtLineItem {
        id: DebtItemId::new("1"),
        authority: "Tax Committee".to_string(),
        description: "Income tax for 2023".to_string(),
        principal: dec!(1500000),
        due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        penalty: dec!(75000),
        status: DebtStatus::Overdue,
    }
}

fn form() -> RawPaymentForm {
    RawPaymentForm {
        channel: "payme".to_string(),
        contact_phone: "+998 90 123 45 67".to_string(),
        contact_email: Some("citizen@example.uz".to_string()),
        consent_given: true,
    }
}

fn tracker(outcomes: impl OutcomeResolver + 'static) -> (PaymentTracker, Metrics) {
    let metrics = Metrics::new().unwrap();
    let tracker = PaymentTracker::new(
        Arc::new(SimulatedGateway::new()),
        Arc::new(outcomes),
        Arc::new(SimulatedReceipts),
        metrics.clone(),
    );
    (tracker, metrics)
}

#[tokio::test(start_paused = true)]
async fn test_completed_payment_lifecycle() {
    let (tracker, metrics) = tracker(FixedOutcome::completed(DELAY));
    let mut events = tracker.subscribe();

    let intent = IntentBuilder::default().build(&income_tax(), &form()).unwrap();
    let record = tracker.submit(intent).await.unwrap();

    assert_eq!(record.status(), PaymentStatus::Processing);
    assert_eq!(record.amount(), dec!(1575000));
    assert_eq!(debt_core::format_uzs(record.amount()), "1 575 000 UZS");

    let initiated = events.recv().await.unwrap();
    assert!(matches!(initiated, PaymentEvent::Initiated { .. }));

    let completed = events.recv().await.unwrap();
    let PaymentEvent::Completed { record: done } = completed else {
        panic!("expected completion, got {:?}", completed);
    };
    assert_eq!(done.id(), record.id());
    assert!(done.receipt_ref().is_some());

    let active = tracker.active().await.unwrap();
    assert_eq!(active.status(), PaymentStatus::Completed);
    assert_eq!(metrics.payments_initiated.get(), 1);
    assert_eq!(metrics.payments_completed.get(), 1);
    assert_eq!(metrics.payments_failed.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_payment_has_no_receipt() {
    let (tracker, metrics) = tracker(FixedOutcome::failed(DELAY));

    let intent = IntentBuilder::default().build(&income_tax(), &form()).unwrap();
    let record = tracker.submit(intent).await.unwrap();

    tokio::time::sleep(DELAY * 2).await;

    let stored = tracker.get(record.id()).await.unwrap();
    assert_eq!(stored.status(), PaymentStatus::Failed);
    assert!(stored.receipt_ref().is_none());
    assert!(stored.failure_reason().is_some());
    assert_eq!(metrics.payments_failed.get(), 1);

    let receipt = tracker.fetch_receipt(record.id()).await;
    assert!(matches!(receipt, Err(Error::ReceiptUnavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn test_receipt_only_after_completion() {
    let (tracker, _) = tracker(FixedOutcome::completed(DELAY));

    let intent = IntentBuilder::default().build(&income_tax(), &form()).unwrap();
    let record = tracker.submit(intent).await.unwrap();

    let early = tracker.fetch_receipt(record.id()).await;
    assert!(matches!(early, Err(Error::ReceiptUnavailable(_))));

    tokio::time::sleep(DELAY * 2).await;

    let receipt = tracker.fetch_receipt(record.id()).await.unwrap();
    assert_eq!(
        receipt,
        Receipt::Url(format!("/api/receipts/rcpt-{}.pdf", record.id()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_creates_independent_record() {
    let (tracker, _) = tracker(FixedOutcome::failed(DELAY));
    let builder = IntentBuilder::default();

    let first = tracker
        .submit(builder.build(&income_tax(), &form()).unwrap())
        .await
        .unwrap();
    tokio::time::sleep(DELAY * 2).await;

    let second = tracker
        .submit(builder.build(&income_tax(), &form()).unwrap())
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(tracker.active().await.unwrap().id(), second.id());
    assert_eq!(
        tracker.get(first.id()).await.unwrap().status(),
        PaymentStatus::Failed
    );
}

#[tokio::test(start_paused = true)]
async fn test_history_newest_first_and_filtered() {
    let (tracker, _) = tracker(FixedOutcome::completed(DELAY));
    let builder = IntentBuilder::default();

    let first = tracker
        .submit(builder.build(&income_tax(), &form()).unwrap())
        .await
        .unwrap();
    tokio::time::sleep(DELAY * 2).await;
    let second = tracker
        .submit(builder.build(&income_tax(), &form()).unwrap())
        .await
        .unwrap();

    let all = tracker.history(&HistoryFilter::default()).await;
    let ids: Vec<_> = all.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);

    let completed = tracker
        .history(&HistoryFilter {
            status: Some(PaymentStatus::Completed),
            date: None,
        })
        .await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id(), first.id());

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let dated = tracker
        .history(&HistoryFilter {
            status: None,
            date: Some(today),
        })
        .await;
    assert_eq!(dated.len(), 2);

    let other_day = tracker
        .history(&HistoryFilter {
            status: None,
            date: Some("1999-01-01".to_string()),
        })
        .await;
    assert!(other_day.is_empty());
}

#[tokio::test]
async fn test_gateway_refusal_leaves_no_record() {
    let metrics = Metrics::new().unwrap();
    let tracker = PaymentTracker::new(
        Arc::new(SimulatedGateway::new().with_unavailable_channel("payme")),
        Arc::new(FixedOutcome::completed(DELAY)),
        Arc::new(SimulatedReceipts),
        metrics.clone(),
    );

    let intent = IntentBuilder::default().build(&income_tax(), &form()).unwrap();
    let result = tracker.submit(intent).await;

    assert!(matches!(result, Err(Error::Service(_))));
    assert!(tracker.active().await.is_none());
    assert!(tracker.history(&HistoryFilter::default()).await.is_empty());
    assert_eq!(metrics.payments_initiated.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_nan_success_ratio_still_resolves() {
    let (tracker, metrics) = tracker(SimulatedOutcome::new(DELAY, f64::NAN));

    let intent = IntentBuilder::default().build(&income_tax(), &form()).unwrap();
    let record = tracker.submit(intent).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    let stored = tracker.get(record.id()).await.unwrap();
    assert_eq!(stored.status(), PaymentStatus::Failed);
    assert_eq!(metrics.payments_failed.get(), 1);
}
