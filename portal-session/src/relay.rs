//! Completed payments flow back into the displayed summary

use debt_core::DebtItemId;
use debt_search::{SearchHandle, SearchState};
use payment_engine::{PaymentEvent, PaymentId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Taxpayer each submitted payment was made for
pub(crate) type PaymentSubjects = Arc<Mutex<HashMap<PaymentId, String>>>;

/// Mark items paid as their payments complete
///
/// An item is only marked while the summary it came from is still displayed;
/// after a new search the completion is dropped.
pub(crate) async fn relay_completions(
    mut events: broadcast::Receiver<PaymentEvent>,
    search: SearchHandle,
    subjects: PaymentSubjects,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Payment relay lagged behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let (record, completed) = match event {
            PaymentEvent::Initiated { .. } => continue,
            PaymentEvent::Completed { record } => (record, true),
            PaymentEvent::Failed { record } => (record, false),
        };

        let subject = subjects.lock().await.remove(&record.id());
        if !completed {
            continue;
        }

        let item_id: DebtItemId = record.target_item_id().clone();
        if subject.is_none() || subject != displayed_subject(&search) {
            debug!(payment_id = %record.id(), item = %item_id, "Summary replaced, paid item not marked");
            continue;
        }

        match search.mark_paid(item_id.clone()).await {
            Ok(true) => info!(payment_id = %record.id(), item = %item_id, "Summary updated after payment"),
            Ok(false) => debug!(item = %item_id, "Paid item no longer displayed"),
            Err(e) => {
                debug!("Search controller gone: {}", e);
                break;
            }
        }
    }
}

fn displayed_subject(search: &SearchHandle) -> Option<String> {
    match search.snapshot().state {
        SearchState::Success(summary) => Some(summary.subject_id),
        _ => None,
    }
}
