//! Receipt retrieval

use crate::types::ReceiptRef;
use async_trait::async_trait;
use bytes::Bytes;
use debt_core::ServiceError;

/// Proof of payment as returned by a receipt service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    /// Download location
    Url(String),
    /// Rendered document
    Document(Bytes),
}

/// Resolves receipt references
#[async_trait]
pub trait ReceiptService: Send + Sync {
    /// Fetch the receipt behind `receipt_ref`
    async fn fetch(&self, receipt_ref: &ReceiptRef) -> Result<Receipt, ServiceError>;
}

/// Receipt service that points at the portal's receipt endpoint
#[derive(Debug, Clone, Default)]
pub struct SimulatedReceipts;

#[async_trait]
impl ReceiptService for SimulatedReceipts {
    async fn fetch(&self, receipt_ref: &ReceiptRef) -> Result<Receipt, ServiceError> {
        Ok(Receipt::Url(format!("/api/receipts/{}.pdf", receipt_ref)))
    }
}
