//! Core types for payment initiation

use chrono::{DateTime, Utc};
use debt_core::{DebtItemId, Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment identifier (UUIDv7 for time-ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Generate a new ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment channel identifier (`payme`, `click`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create new channel ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to proof of payment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptRef(String);

impl ReceiptRef {
    /// Create new receipt reference
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment dialog contents as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPaymentForm {
    /// Selected channel id
    pub channel: String,

    /// Phone for payment confirmation
    pub contact_phone: String,

    /// Email for the receipt
    pub contact_email: Option<String>,

    /// Personal data consent
    pub consent_given: bool,
}

/// Validated payment request
///
/// Only [`crate::IntentBuilder`] constructs intents, so every intent carries
/// consent and an amount computed from its item at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    target_item_id: DebtItemId,
    channel: ChannelId,
    contact_phone: String,
    contact_email: Option<String>,
    consent_given: bool,
    amount: Decimal,
}

impl PaymentIntent {
    pub(crate) fn new(
        target_item_id: DebtItemId,
        channel: ChannelId,
        contact_phone: String,
        contact_email: Option<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            target_item_id,
            channel,
            contact_phone,
            contact_email,
            consent_given: true,
            amount,
        }
    }

    /// Item being paid
    pub fn target_item_id(&self) -> &DebtItemId {
        &self.target_item_id
    }

    /// Selected channel
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Confirmation phone
    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    /// Receipt email
    pub fn contact_email(&self) -> Option<&str> {
        self.contact_email.as_deref()
    }

    /// Always true for a built intent
    pub fn consent_given(&self) -> bool {
        self.consent_given
    }

    /// Principal plus penalty at build time
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created, not yet accepted by the gateway
    Pending,
    /// Accepted, awaiting the outcome
    Processing,
    /// Paid; receipt available
    Completed,
    /// Declined or errored
    Failed,
}

impl PaymentStatus {
    /// No further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal result reported for a processing payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Funds collected
    Completed {
        /// Proof of payment
        receipt_ref: ReceiptRef,
    },
    /// Payment declined
    Failed {
        /// Reason shown to the user
        reason: String,
    },
}

/// Tracked payment
///
/// Deserializing checks that the receipt reference and the failure reason
/// agree with the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct PaymentRecord {
    id: PaymentId,
    target_item_id: DebtItemId,
    channel: ChannelId,
    amount: Decimal,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    receipt_ref: Option<ReceiptRef>,
    failure_reason: Option<String>,
}

#[derive(Deserialize)]
struct RecordFields {
    id: PaymentId,
    target_item_id: DebtItemId,
    channel: ChannelId,
    amount: Decimal,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    receipt_ref: Option<ReceiptRef>,
    failure_reason: Option<String>,
}

impl TryFrom<RecordFields> for PaymentRecord {
    type Error = Error;

    fn try_from(fields: RecordFields) -> Result<Self> {
        let completed = fields.status == PaymentStatus::Completed;
        let failed = fields.status == PaymentStatus::Failed;
        if fields.receipt_ref.is_some() != completed || fields.failure_reason.is_some() != failed {
            return Err(Error::InvalidTransition(format!(
                "payment {} is {} with inconsistent receipt or failure reason",
                fields.id, fields.status
            )));
        }

        Ok(Self {
            id: fields.id,
            target_item_id: fields.target_item_id,
            channel: fields.channel,
            amount: fields.amount,
            status: fields.status,
            created_at: fields.created_at,
            receipt_ref: fields.receipt_ref,
            failure_reason: fields.failure_reason,
        })
    }
}

impl PaymentRecord {
    /// New `Pending` record for an intent
    pub fn pending(intent: &PaymentIntent) -> Self {
        Self {
            id: PaymentId::new(),
            target_item_id: intent.target_item_id.clone(),
            channel: intent.channel.clone(),
            amount: intent.amount,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            receipt_ref: None,
            failure_reason: None,
        }
    }

    /// New record already accepted by the gateway
    pub fn processing(intent: &PaymentIntent) -> Self {
        let mut record = Self::pending(intent);
        record.status = PaymentStatus::Processing;
        record
    }

    /// `Pending -> Processing`
    pub fn start_processing(&mut self) -> Result<()> {
        self.expect_status(PaymentStatus::Pending, PaymentStatus::Processing)?;
        self.status = PaymentStatus::Processing;
        Ok(())
    }

    /// `Processing -> Completed`
    pub fn complete(&mut self, receipt_ref: ReceiptRef) -> Result<()> {
        self.expect_status(PaymentStatus::Processing, PaymentStatus::Completed)?;
        self.status = PaymentStatus::Completed;
        self.receipt_ref = Some(receipt_ref);
        Ok(())
    }

    /// `Processing -> Failed`
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.expect_status(PaymentStatus::Processing, PaymentStatus::Failed)?;
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Apply a terminal outcome
    pub fn apply(&mut self, outcome: PaymentOutcome) -> Result<()> {
        match outcome {
            PaymentOutcome::Completed { receipt_ref } => self.complete(receipt_ref),
            PaymentOutcome::Failed { reason } => self.fail(reason),
        }
    }

    fn expect_status(&self, from: PaymentStatus, to: PaymentStatus) -> Result<()> {
        if self.status != from {
            return Err(Error::InvalidTransition(format!(
                "payment {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        Ok(())
    }

    /// Payment ID
    pub fn id(&self) -> PaymentId {
        self.id
    }

    /// Item being paid
    pub fn target_item_id(&self) -> &DebtItemId {
        &self.target_item_id
    }

    /// Channel used
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Amount frozen from the intent
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Current status
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Receipt reference, present iff `Completed`
    pub fn receipt_ref(&self) -> Option<&ReceiptRef> {
        self.receipt_ref.as_ref()
    }

    /// Failure reason, present iff `Failed`
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}
