use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Enrollment;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub course_id: Uuid,
    /// Amount the client expects to pay. Optional; the catalog price is charged.
    #[schema(value_type = Option<String>, example = "4999.00")]
    pub amount: Option<Decimal>,
}

/// Handle the client passes to the processor's checkout widget.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct OrderHandle {
    pub order_id: String,
    #[schema(value_type = String, example = "4999.00")]
    pub amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub course_id: Uuid,
    #[schema(value_type = String, example = "4999.00")]
    pub amount_paid: Decimal,
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    Enrolled,
    AlreadyEnrolled,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub outcome: EnrollmentOutcome,
    pub enrollment: Enrollment,
}
