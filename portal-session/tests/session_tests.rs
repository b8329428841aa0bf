//! End-to-end debt check scenarios under a paused clock

use debt_core::{
    Config, DebtItemId, DebtStatus, Error, IdentityInput, Metrics, SearchMode, ValidationError,
};
use debt_search::{MockDebtRegistry, SearchSnapshot, SearchState};
use payment_engine::{
    FixedOutcome, HistoryFilter, PaymentEvent, PaymentStatus, RawPaymentForm, Receipt,
    SimulatedGateway, SimulatedReceipts,
};
use portal_session::{DebtCheckSession, SessionServices};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const PROCESSING: Duration = Duration::from_millis(3000);

fn session_with(outcomes: FixedOutcome) -> DebtCheckSession {
    let config = Config::default();
    let services = SessionServices {
        lookup: Arc::new(MockDebtRegistry::from_config(&config.mock)),
        gateway: Arc::new(SimulatedGateway::new()),
        outcomes: Arc::new(outcomes),
        receipts: Arc::new(SimulatedReceipts),
    };
    DebtCheckSession::with_services(&config, services, Metrics::new().unwrap()).unwrap()
}

fn is_settled(snapshot: &SearchSnapshot) -> bool {
    matches!(
        snapshot.state,
        SearchState::Success(_) | SearchState::NotFound | SearchState::Error(_)
    )
}

fn form() -> RawPaymentForm {
    RawPaymentForm {
        channel: "payme".to_string(),
        contact_phone: "+998 90 123 45 67".to_string(),
        contact_email: None,
        consent_given: true,
    }
}

async fn type_and_settle(session: &DebtCheckSession, value: &str) -> SearchSnapshot {
    for end in 1..=value.len() {
        session.type_tax_id(&value[..end]).await.unwrap();
    }
    session.wait_for(is_settled).await.unwrap()
}

fn item_status(session: &DebtCheckSession, id: &str) -> DebtStatus {
    let SearchState::Success(summary) = session.snapshot().state else {
        panic!("expected success");
    };
    summary.item(&DebtItemId::new(id)).unwrap().status
}

#[tokio::test(start_paused = true)]
async fn test_lookup_then_pay_marks_item_paid() {
    let session = session_with(FixedOutcome::completed(PROCESSING));

    let snapshot = type_and_settle(&session, "123456789").await;
    let SearchState::Success(summary) = snapshot.state else {
        panic!("expected success, got {:?}", snapshot.state);
    };
    assert_eq!(summary.items.len(), 2);
    assert_eq!(summary.total_principal(), dec!(2500000));

    let dialog = session.open_payment(&DebtItemId::new("1")).unwrap();
    assert_eq!(dialog.amount(), dec!(1575000));
    assert_eq!(dialog.amount_display(), "1 575 000 UZS");
    assert_eq!(dialog.channels().len(), 4);

    let mut events = session.payment_events();
    let record = session.submit_payment(dialog, &form()).await.unwrap();
    assert_eq!(record.status(), PaymentStatus::Processing);
    assert_eq!(record.amount(), dec!(1575000));

    loop {
        if let PaymentEvent::Completed { .. } = events.recv().await.unwrap() {
            break;
        }
    }
    let snapshot = session
        .wait_for(|s| match &s.state {
            SearchState::Success(summary) => summary
                .item(&DebtItemId::new("1"))
                .is_some_and(|item| item.status == DebtStatus::Paid),
            _ => false,
        })
        .await
        .unwrap();
    assert!(matches!(snapshot.state, SearchState::Success(_)));
    assert_eq!(item_status(&session, "2"), DebtStatus::Active);

    let receipt = session.fetch_receipt(record.id()).await.unwrap();
    assert_eq!(
        receipt,
        Receipt::Url(format!("/api/receipts/rcpt-{}.pdf", record.id()))
    );

    let paid = session.open_payment(&DebtItemId::new("1"));
    assert!(matches!(paid, Err(Error::Validation(_))));
}

#[tokio::test(start_paused = true)]
async fn test_sentinel_not_found() {
    let session = session_with(FixedOutcome::completed(PROCESSING));

    let snapshot = type_and_settle(&session, "000000000").await;
    assert_eq!(snapshot.state, SearchState::NotFound);

    let result = session.open_payment(&DebtItemId::new("1"));
    assert!(matches!(result, Err(Error::ItemNotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_failed_payment_leaves_item_open() {
    let session = session_with(FixedOutcome::failed(PROCESSING));
    type_and_settle(&session, "123456789").await;

    let dialog = session.open_payment(&DebtItemId::new("2")).unwrap();
    let record = session.submit_payment(dialog, &form()).await.unwrap();
    tokio::time::sleep(PROCESSING * 2).await;

    let active = session.active_payment().await.unwrap();
    assert_eq!(active.id(), record.id());
    assert_eq!(active.status(), PaymentStatus::Failed);
    assert_eq!(item_status(&session, "2"), DebtStatus::Active);

    let receipt = session.fetch_receipt(record.id()).await;
    assert!(matches!(receipt, Err(Error::ReceiptUnavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_form_creates_no_record() {
    let session = session_with(FixedOutcome::completed(PROCESSING));
    type_and_settle(&session, "123456789").await;

    let dialog = session.open_payment(&DebtItemId::new("1")).unwrap();
    let form = RawPaymentForm {
        contact_phone: "123".to_string(),
        consent_given: false,
        ..form()
    };
    let result = session.submit_payment(dialog, &form).await;

    let Err(Error::Validation(errors)) = result else {
        panic!("expected validation errors");
    };
    assert!(errors.contains(&ValidationError::ConsentRequired));
    assert_eq!(errors.len(), 2);
    assert!(session.active_payment().await.is_none());
    assert!(session
        .payment_history(&HistoryFilter::default())
        .await
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_dialog_has_no_side_effects() {
    let session = session_with(FixedOutcome::completed(PROCESSING));
    type_and_settle(&session, "123456789").await;

    let before = session.snapshot();
    session.open_payment(&DebtItemId::new("1")).unwrap().cancel();

    assert!(session.active_payment().await.is_none());
    assert_eq!(session.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn test_completion_after_new_search_does_not_touch_new_summary() {
    let session = session_with(FixedOutcome::completed(PROCESSING));
    type_and_settle(&session, "123456789").await;

    let dialog = session.open_payment(&DebtItemId::new("1")).unwrap();
    session.submit_payment(dialog, &form()).await.unwrap();

    // Different taxpayer, same item ids
    session
        .submit_search(IdentityInput::tax_id("987654321"))
        .await
        .unwrap();
    tokio::time::sleep(PROCESSING * 2).await;

    let SearchState::Success(summary) = session.snapshot().state else {
        panic!("expected success");
    };
    assert_eq!(summary.subject_id, "987654321");
    assert_eq!(item_status(&session, "1"), DebtStatus::Overdue);
}

#[tokio::test(start_paused = true)]
async fn test_full_name_search() {
    let session = session_with(FixedOutcome::completed(PROCESSING));

    session.set_mode(SearchMode::FullName).await.unwrap();
    let invalid = session
        .submit_search(IdentityInput::FullName {
            last: "I".into(),
            first: String::new(),
            middle: String::new(),
        })
        .await;
    let Err(Error::Validation(errors)) = invalid else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 2);

    session
        .submit_search(IdentityInput::FullName {
            last: "Ivanov".into(),
            first: "Ivan".into(),
            middle: "Ivanovich".into(),
        })
        .await
        .unwrap();
    let snapshot = session.wait_for(is_settled).await.unwrap();
    let SearchState::Success(summary) = snapshot.state else {
        panic!("expected success");
    };
    assert_eq!(summary.subject_id, "123456789");
    assert_eq!(snapshot.mode, SearchMode::FullName);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let mut config = Config::default();
    config.payment.success_ratio = f64::NAN;
    assert!(matches!(
        DebtCheckSession::new(&config),
        Err(Error::Config(_))
    ));

    config.payment.success_ratio = 0.7;
    config.search.mailbox_capacity = 0;
    assert!(matches!(
        DebtCheckSession::new(&config),
        Err(Error::Config(_))
    ));
}
