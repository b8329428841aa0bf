//! Per-user debt check session

use crate::dialog::PaymentDialog;
use crate::relay::{relay_completions, PaymentSubjects};
use debt_core::{
    Config, DebtItemId, Error, IdentityInput, Metrics, Result, SearchMode, ValidationError,
};
use debt_search::{
    spawn_search_controller, DebtLookupService, MockDebtRegistry, SearchHandle, SearchSnapshot,
    SearchState,
};
use payment_engine::{
    HistoryFilter, IntentBuilder, OutcomeResolver, PaymentEvent, PaymentGateway, PaymentId,
    PaymentRecord, PaymentTracker, RawPaymentForm, Receipt, ReceiptService, SimulatedGateway,
    SimulatedOutcome, SimulatedReceipts,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

/// Collaborators a session talks to
#[derive(Clone)]
pub struct SessionServices {
    /// Debt registry
    pub lookup: Arc<dyn DebtLookupService>,

    /// Payment gateway
    pub gateway: Arc<dyn PaymentGateway>,

    /// Source of payment outcomes
    pub outcomes: Arc<dyn OutcomeResolver>,

    /// Receipt store
    pub receipts: Arc<dyn ReceiptService>,
}

impl SessionServices {
    /// In-process simulations configured from `config`
    pub fn simulated(config: &Config) -> Self {
        Self {
            lookup: Arc::new(MockDebtRegistry::from_config(&config.mock)),
            gateway: Arc::new(SimulatedGateway::new()),
            outcomes: Arc::new(SimulatedOutcome::from_config(&config.payment)),
            receipts: Arc::new(SimulatedReceipts),
        }
    }
}

impl fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}

/// Debt check session
///
/// Owns one search controller and one payment tracker. Dropping the session
/// stops the controller; lookups and payment resolutions already running
/// finish on their own and their results are ignored.
#[derive(Debug)]
pub struct DebtCheckSession {
    search: SearchHandle,
    intents: IntentBuilder,
    tracker: PaymentTracker,
    subjects: PaymentSubjects,
    relay: JoinHandle<()>,
    metrics: Metrics,
}

impl DebtCheckSession {
    /// Session over the simulated services
    pub fn new(config: &Config) -> Result<Self> {
        let metrics =
            Metrics::new().map_err(|e| Error::Config(format!("metrics registry: {}", e)))?;
        Self::with_services(config, SessionServices::simulated(config), metrics)
    }

    /// Session over caller-provided services
    ///
    /// Must be called inside a tokio runtime. Fails if `config` does not
    /// validate.
    pub fn with_services(
        config: &Config,
        services: SessionServices,
        metrics: Metrics,
    ) -> Result<Self> {
        config.validate()?;

        let search =
            spawn_search_controller(services.lookup, config.search.clone(), metrics.clone());
        let tracker = PaymentTracker::new(
            services.gateway,
            services.outcomes,
            services.receipts,
            metrics.clone(),
        );
        let subjects: PaymentSubjects = Arc::new(Mutex::new(HashMap::new()));
        let relay = tokio::spawn(relay_completions(
            tracker.subscribe(),
            search.clone(),
            Arc::clone(&subjects),
        ));

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            "Debt check session started"
        );

        Ok(Self {
            search,
            intents: IntentBuilder::from_config(&config.payment),
            tracker,
            subjects,
            relay,
            metrics,
        })
    }

    /// Tax id field changed
    pub async fn type_tax_id(&self, value: impl Into<String>) -> Result<()> {
        self.search.input_changed(value).await
    }

    /// Switch between tax id and full-name search
    pub async fn set_mode(&self, mode: SearchMode) -> Result<()> {
        self.search.set_mode(mode).await
    }

    /// Search now, skipping the debounce
    pub async fn submit_search(&self, input: IdentityInput) -> Result<()> {
        self.search.submit(input).await
    }

    /// Latest search snapshot
    pub fn snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    /// Receiver notified on every search state change
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.search.subscribe()
    }

    /// Wait until the search snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SearchSnapshot) -> bool,
    ) -> Result<SearchSnapshot> {
        self.search.wait_for(predicate).await
    }

    /// Open the payment dialog for an item of the displayed summary
    pub fn open_payment(&self, item_id: &DebtItemId) -> Result<PaymentDialog> {
        let summary = match self.search.snapshot().state {
            SearchState::Success(summary) => summary,
            _ => return Err(Error::ItemNotFound(item_id.to_string())),
        };

        let item = summary
            .item(item_id)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;
        if !item.is_payable() {
            return Err(ValidationError::ItemNotPayable(item_id.to_string()).into());
        }

        let channels = self.intents.channels().iter().cloned().collect();
        Ok(PaymentDialog::new(summary.subject_id, item, channels))
    }

    /// Validate the dialog and hand the payment to the tracker
    ///
    /// Validation failures return every failing field and create no record.
    pub async fn submit_payment(
        &self,
        dialog: PaymentDialog,
        form: &RawPaymentForm,
    ) -> Result<PaymentRecord> {
        let intent = self.intents.build(&dialog.item, form)?;

        // Held across submit so the relay cannot see the outcome first
        let mut subjects = self.subjects.lock().await;
        let record = self.tracker.submit(intent).await?;
        subjects.insert(record.id(), dialog.subject_id);

        Ok(record)
    }

    /// Payment lifecycle events
    pub fn payment_events(&self) -> broadcast::Receiver<PaymentEvent> {
        self.tracker.subscribe()
    }

    /// Most recently submitted payment
    pub async fn active_payment(&self) -> Option<PaymentRecord> {
        self.tracker.active().await
    }

    /// Payment history, newest first
    pub async fn payment_history(&self, filter: &HistoryFilter) -> Vec<PaymentRecord> {
        self.tracker.history(filter).await
    }

    /// Receipt of a completed payment
    pub async fn fetch_receipt(&self, id: PaymentId) -> Result<Receipt> {
        self.tracker.fetch_receipt(id).await
    }

    /// Session metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop the search controller
    pub async fn shutdown(self) -> Result<()> {
        self.search.shutdown().await
    }
}

impl Drop for DebtCheckSession {
    fn drop(&mut self) {
        self.relay.abort();
    }
}
