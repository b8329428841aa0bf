//! Debt check demo binary
//!
//! Runs one scripted session: look up tax id 123456789, pay its first open
//! item through Payme and report the outcome.

use anyhow::Context;
use debt_core::{format_uzs, Config};
use debt_search::SearchState;
use payment_engine::{HistoryFilter, PaymentEvent, RawPaymentForm};
use portal_session::DebtCheckSession;
use prometheus::{Encoder, TextEncoder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting debt check demo");

    // Load configuration
    let config = match std::env::var("DEBT_CHECK_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    let session = DebtCheckSession::new(&config)?;

    for end in 1..="123456789".len() {
        session.type_tax_id(&"123456789"[..end]).await?;
    }

    let snapshot = session
        .wait_for(|s| {
            matches!(
                s.state,
                SearchState::Success(_) | SearchState::NotFound | SearchState::Error(_)
            )
        })
        .await?;
    tracing::info!("Search state: {}", serde_json::to_string(&snapshot.state)?);

    let summary = match snapshot.state {
        SearchState::Success(summary) => summary,
        other => anyhow::bail!("lookup did not find debts: {:?}", other),
    };
    tracing::info!(
        subject = %summary.subject_name,
        principal = %format_uzs(summary.total_principal()),
        penalty = %format_uzs(summary.total_penalty()),
        total = %format_uzs(summary.total_due()),
        "Debts found"
    );

    let item_id = summary
        .payable_items()
        .next()
        .map(|item| item.id.clone())
        .context("no payable items")?;
    let dialog = session.open_payment(&item_id)?;
    tracing::info!(item = %item_id, amount = %dialog.amount_display(), "Paying item");

    let mut events = session.payment_events();
    let form = RawPaymentForm {
        channel: "payme".to_string(),
        contact_phone: "+998 90 123 45 67".to_string(),
        contact_email: Some("citizen@example.uz".to_string()),
        consent_given: true,
    };
    let record = session.submit_payment(dialog, &form).await?;

    loop {
        match events.recv().await? {
            PaymentEvent::Completed { record: done } if done.id() == record.id() => {
                let receipt = session.fetch_receipt(done.id()).await?;
                tracing::info!(payment_id = %done.id(), "Payment completed, receipt: {:?}", receipt);
                break;
            }
            PaymentEvent::Failed { record: done } if done.id() == record.id() => {
                tracing::warn!(
                    payment_id = %done.id(),
                    reason = done.failure_reason().unwrap_or_default(),
                    "Payment failed"
                );
                break;
            }
            _ => {}
        }
    }

    let history = session.payment_history(&HistoryFilter::default()).await;
    tracing::info!("Payment history: {} record(s)", history.len());

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&session.metrics().registry.gather(), &mut buffer)?;
    println!("{}", String::from_utf8(buffer)?);

    session.shutdown().await?;
    tracing::info!("Shutting down debt check demo");
    Ok(())
}
