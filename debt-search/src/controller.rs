//! Search controller actor
//!
//! Single task owning all search state:
//! - tax id keystrokes restart one debounce timer (the previous timer is
//!   dropped, so it can never fire)
//! - explicit submits bypass the timer
//! - every dispatched lookup carries a sequence number; the configured
//!   [`StaleResponsePolicy`] decides whether superseded responses are shown
//!
//! Snapshots are published on a `watch` channel after every change.

use crate::service::{DebtLookupService, LookupOutcome};
use debt_core::config::{SearchConfig, StaleResponsePolicy};
use debt_core::{
    resolve, DebtItemId, DebtSummary, Error, IdentityInput, LookupKey, Metrics, Result,
    SearchMode, ServiceError, ValidationErrors,
};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Sleep};

/// Search state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum SearchState {
    /// Nothing requested yet
    Idle,
    /// Waiting for the input to settle
    Debouncing,
    /// Lookup in flight
    Loading,
    /// Summary for the last accepted lookup
    Success(DebtSummary),
    /// Registry has no data for the key
    NotFound,
    /// Lookup failed; message is shown in a dismissible banner
    Error(String),
}

/// What the UI renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSnapshot {
    /// Current state
    pub state: SearchState,

    /// Active search tab
    pub mode: SearchMode,

    /// Current tax id field contents
    pub query: String,

    /// Per-field errors from the last rejected input
    pub field_errors: Option<ValidationErrors>,

    /// Lookups dispatched but not yet answered
    pub in_flight: usize,

    /// Bumped on every publish
    pub generation: u64,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            state: SearchState::Idle,
            mode: SearchMode::default(),
            query: String::new(),
            field_errors: None,
            in_flight: 0,
            generation: 0,
        }
    }
}

/// Message sent to the search controller
enum SearchMessage {
    /// Tax id field changed
    InputChanged { value: String },

    /// Tab switched
    SetMode { mode: SearchMode },

    /// Search button pressed
    Submit {
        input: IdentityInput,
        response: oneshot::Sender<std::result::Result<(), ValidationErrors>>,
    },

    /// Payment against an item completed
    MarkPaid {
        item_id: DebtItemId,
        response: oneshot::Sender<bool>,
    },

    /// Stop the controller
    Shutdown,
}

/// Answer from a detached lookup task
struct LookupCompleted {
    seq: u64,
    key: LookupKey,
    result: std::result::Result<LookupOutcome, ServiceError>,
}

/// Actor that owns the search state
struct SearchController {
    service: Arc<dyn DebtLookupService>,
    config: SearchConfig,
    metrics: Metrics,

    mailbox: mpsc::Receiver<SearchMessage>,
    completions_tx: mpsc::UnboundedSender<LookupCompleted>,
    completions: mpsc::UnboundedReceiver<LookupCompleted>,
    state_tx: watch::Sender<SearchSnapshot>,

    snapshot: SearchSnapshot,
    debounce: Option<Pin<Box<Sleep>>>,

    /// Sequence number of the next dispatched lookup
    next_seq: u64,
    /// Responses below this sequence are stale under `Discard`
    accept_from: u64,
}

impl SearchController {
    async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.mailbox.recv() => match msg {
                    Some(SearchMessage::Shutdown) | None => break,
                    Some(msg) => self.handle_message(msg),
                },

                Some(done) = self.completions.recv() => self.apply_completion(done),

                _ = debounce_elapsed(&mut self.debounce), if self.debounce.is_some() => {
                    self.debounce = None;
                    self.fire_debounce();
                }
            }
        }

        tracing::debug!(in_flight = self.snapshot.in_flight, "Search controller stopped");
    }

    fn handle_message(&mut self, msg: SearchMessage) {
        match msg {
            SearchMessage::InputChanged { value } => self.input_changed(value),

            SearchMessage::SetMode { mode } => {
                self.cancel_debounce();
                self.snapshot.mode = mode;
                self.snapshot.field_errors = None;
                self.publish();
            }

            SearchMessage::Submit { input, response } => {
                let _ = response.send(self.submit(input));
            }

            SearchMessage::MarkPaid { item_id, response } => {
                let marked = match &mut self.snapshot.state {
                    SearchState::Success(summary) => summary.mark_paid(&item_id),
                    _ => false,
                };
                if marked {
                    tracing::info!(item = %item_id, "Debt item marked paid");
                    self.publish();
                }
                let _ = response.send(marked);
            }

            SearchMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn input_changed(&mut self, value: String) {
        self.snapshot.query = value;

        if self.snapshot.mode != SearchMode::TaxId {
            self.publish();
            return;
        }

        if self.snapshot.query.is_empty() {
            self.cancel_debounce();
            self.publish();
            return;
        }

        // Anything already in flight now answers an outdated query
        if self.config.stale_responses == StaleResponsePolicy::Discard {
            self.accept_from = self.next_seq;
        }

        let window = Duration::from_millis(self.config.debounce_ms);
        self.debounce = Some(Box::pin(tokio::time::sleep(window)));
        self.snapshot.state = SearchState::Debouncing;
        tracing::debug!(query = %self.snapshot.query, "Debounce restarted");
        self.publish();
    }

    fn fire_debounce(&mut self) {
        let query = self.snapshot.query.trim().to_string();

        if query.chars().count() < self.config.min_query_len {
            tracing::debug!(%query, "Query too short, lookup skipped");
            self.snapshot.state = SearchState::Idle;
            self.publish();
            return;
        }

        match resolve(&IdentityInput::tax_id(query)) {
            Ok(key) => {
                self.snapshot.field_errors = None;
                self.dispatch(key);
            }
            Err(errors) => {
                tracing::debug!(%errors, "Debounced input rejected");
                self.snapshot.state = SearchState::Idle;
                self.snapshot.field_errors = Some(errors);
                self.publish();
            }
        }
    }

    fn submit(&mut self, input: IdentityInput) -> std::result::Result<(), ValidationErrors> {
        let key = match resolve(&input) {
            Ok(key) => key,
            Err(errors) => {
                self.snapshot.field_errors = Some(errors.clone());
                self.publish();
                return Err(errors);
            }
        };

        self.debounce = None;
        if let IdentityInput::TaxId { value } = &input {
            self.snapshot.query = value.clone();
        }
        self.snapshot.mode = input.mode();
        self.snapshot.field_errors = None;
        self.dispatch(key);
        Ok(())
    }

    fn dispatch(&mut self, key: LookupKey) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.config.stale_responses == StaleResponsePolicy::Discard {
            self.accept_from = seq;
        }

        self.snapshot.state = SearchState::Loading;
        self.snapshot.in_flight += 1;
        self.metrics.lookups_dispatched.inc();
        tracing::info!(seq, key = %key, "Dispatching debt lookup");

        let service = Arc::clone(&self.service);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = service.lookup(&key).await;
            // Controller gone: nobody is left to show the answer
            let _ = completions.send(LookupCompleted { seq, key, result });
        });

        self.publish();
    }

    fn apply_completion(&mut self, done: LookupCompleted) {
        self.snapshot.in_flight = self.snapshot.in_flight.saturating_sub(1);

        if done.seq < self.accept_from {
            tracing::debug!(seq = done.seq, key = %done.key, "Discarding stale lookup response");
            self.metrics.lookups_stale.inc();
            self.publish();
            return;
        }

        self.snapshot.state = match done.result {
            Ok(LookupOutcome::Found(summary)) => {
                tracing::info!(
                    seq = done.seq,
                    items = summary.items.len(),
                    total_due = %summary.total_due(),
                    "Debt lookup succeeded"
                );
                SearchState::Success(summary)
            }
            Ok(LookupOutcome::NotFound) => {
                tracing::info!(seq = done.seq, key = %done.key, "No debt data found");
                SearchState::NotFound
            }
            Err(e) => {
                tracing::warn!(seq = done.seq, key = %done.key, "Debt lookup failed: {}", e);
                self.metrics.lookup_failures.inc();
                SearchState::Error(e.to_string())
            }
        };
        self.publish();
    }

    fn cancel_debounce(&mut self) {
        if self.debounce.take().is_some() && self.snapshot.state == SearchState::Debouncing {
            self.snapshot.state = SearchState::Idle;
        }
    }

    fn publish(&mut self) {
        self.snapshot.generation += 1;
        self.state_tx.send_replace(self.snapshot.clone());
    }
}

async fn debounce_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Handle for sending messages to the controller
#[derive(Clone, Debug)]
pub struct SearchHandle {
    sender: mpsc::Sender<SearchMessage>,
    state: watch::Receiver<SearchSnapshot>,
}

impl std::fmt::Debug for SearchMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SearchMessage::InputChanged { .. } => "InputChanged",
            SearchMessage::SetMode { .. } => "SetMode",
            SearchMessage::Submit { .. } => "Submit",
            SearchMessage::MarkPaid { .. } => "MarkPaid",
            SearchMessage::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl SearchHandle {
    /// Tax id field changed
    pub async fn input_changed(&self, value: impl Into<String>) -> Result<()> {
        self.send(SearchMessage::InputChanged {
            value: value.into(),
        })
        .await
    }

    /// Switch search tab
    pub async fn set_mode(&self, mode: SearchMode) -> Result<()> {
        self.send(SearchMessage::SetMode { mode }).await
    }

    /// Validate and search immediately
    pub async fn submit(&self, input: IdentityInput) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SearchMessage::Submit { input, response: tx })
            .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
            .map_err(Error::Validation)
    }

    /// Flag an item of the displayed summary as paid
    pub async fn mark_paid(&self, item_id: DebtItemId) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(SearchMessage::MarkPaid {
            item_id,
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.state.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SearchSnapshot) -> bool,
    ) -> Result<SearchSnapshot> {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| Error::Concurrency("Search controller stopped".to_string()))?;
        Ok(snapshot.clone())
    }

    /// Stop the controller
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SearchMessage::Shutdown).await
    }

    async fn send(&self, msg: SearchMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }
}

/// Spawn the search controller
pub fn spawn_search_controller(
    service: Arc<dyn DebtLookupService>,
    config: SearchConfig,
    metrics: Metrics,
) -> SearchHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
    let (completions_tx, completions) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SearchSnapshot::default());

    let controller = SearchController {
        service,
        config,
        metrics,
        mailbox: rx,
        completions_tx,
        completions,
        state_tx,
        snapshot: SearchSnapshot::default(),
        debounce: None,
        next_seq: 0,
        accept_from: 0,
    };

    tokio::spawn(async move {
        controller.run().await;
    });

    SearchHandle {
        sender: tx,
        state: state_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockDebtRegistry;
    use debt_core::Field;

    fn spawn(registry: Arc<MockDebtRegistry>) -> SearchHandle {
        spawn_search_controller(registry, SearchConfig::default(), Metrics::new().unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_enters_debouncing() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(1500)));
        let handle = spawn(registry.clone());

        handle.input_changed("1234").await.unwrap();
        let snapshot = handle
            .wait_for(|s| s.state == SearchState::Debouncing)
            .await
            .unwrap();
        assert_eq!(snapshot.query, "1234");
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_skips_lookup() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(1500)));
        let handle = spawn(registry.clone());

        handle.input_changed("12").await.unwrap();
        handle
            .wait_for(|s| s.state == SearchState::Debouncing)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, SearchState::Idle);
        assert!(snapshot.field_errors.is_none());
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_debounced_input_never_dispatched() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(1500)));
        let handle = spawn(registry.clone());

        handle.input_changed("12345").await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, SearchState::Idle);
        assert!(snapshot
            .field_errors
            .as_ref()
            .and_then(|e| e.for_field(Field::TaxId))
            .is_some());
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_validation_keeps_state() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(100)));
        let handle = spawn(registry.clone());

        let result = handle
            .submit(IdentityInput::FullName {
                last: "I".into(),
                first: "Ivan".into(),
                middle: String::new(),
            })
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, SearchState::Idle);
        assert!(snapshot
            .field_errors
            .as_ref()
            .and_then(|e| e.for_field(Field::LastName))
            .is_some());
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_cancels_debounce() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(100)));
        let handle = spawn(registry.clone());

        handle.input_changed("123456789").await.unwrap();
        handle.set_mode(SearchMode::FullName).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, SearchState::Idle);
        assert_eq!(snapshot.mode, SearchMode::FullName);
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_paid_outside_success_is_noop() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(100)));
        let handle = spawn(registry);

        assert!(!handle.mark_paid(DebtItemId::new("1")).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_mailbox() {
        let registry = Arc::new(MockDebtRegistry::new(Duration::from_millis(100)));
        let handle = spawn(registry);

        handle.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let result = handle.input_changed("123").await;
        assert!(matches!(result, Err(Error::Concurrency(_))));
    }
}
