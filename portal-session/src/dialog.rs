//! Payment dialog draft

use debt_core::{format_uzs, DebtLineItem};
use payment_engine::PaymentChannel;
use rust_decimal::Decimal;

/// Open payment dialog for one debt line item
///
/// Holds its own copy of the item, so later changes to the displayed summary
/// do not alter what is being paid. Dropping or [cancelling](Self::cancel) the
/// dialog has no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDialog {
    pub(crate) subject_id: String,
    pub(crate) item: DebtLineItem,
    channels: Vec<PaymentChannel>,
}

impl PaymentDialog {
    pub(crate) fn new(subject_id: String, item: DebtLineItem, channels: Vec<PaymentChannel>) -> Self {
        Self {
            subject_id,
            item,
            channels,
        }
    }

    /// Item being paid
    pub fn item(&self) -> &DebtLineItem {
        &self.item
    }

    /// Taxpayer the item belongs to
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Principal plus penalty
    pub fn amount(&self) -> Decimal {
        self.item.amount_due()
    }

    /// Amount as shown in the dialog header
    pub fn amount_display(&self) -> String {
        format_uzs(self.amount())
    }

    /// Channels offered in the selector
    pub fn channels(&self) -> &[PaymentChannel] {
        &self.channels
    }

    /// Close the dialog without paying
    pub fn cancel(self) {
        tracing::debug!(item = %self.item.id, "Payment dialog cancelled");
    }
}
