//! Boundary to the external payment processor.
//!
//! The processor owns the order lifecycle; nothing about an order is
//! persisted locally, so an abandoned checkout leaves no state behind.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Charge request handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Amount in minor currency units.
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub course_id: Uuid,
    pub student_id: Uuid,
}

/// Processor-side handle for a pending charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("processor rejected the order: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<PaymentOrder, GatewayError>;

    /// Public key the client checkout widget needs to open the order.
    fn public_key(&self) -> &str;
}
