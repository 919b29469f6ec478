use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::gateway::{GatewayError, NewOrder, OrderGateway, PaymentOrder};
use crate::config::PaymentConfig;

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
    notes: OrderNotes,
}

#[derive(Serialize)]
struct OrderNotes {
    course_id: String,
    student_id: String,
}

#[derive(Deserialize)]
struct CreateOrderReply {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
}

/// Orders API client for Razorpay.
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &PaymentConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }
}

#[async_trait]
impl OrderGateway for RazorpayGateway {
    async fn create_order(&self, order: NewOrder) -> Result<PaymentOrder, GatewayError> {
        if order.amount_minor <= 0 {
            return Err(GatewayError::InvalidAmount(order.amount_minor));
        }

        let body = CreateOrderBody {
            amount: order.amount_minor,
            currency: &order.currency,
            receipt: &order.receipt,
            payment_capture: 1,
            notes: OrderNotes {
                course_id: order.course_id.to_string(),
                student_id: order.student_id.to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: CreateOrderReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        tracing::debug!(order_id = %reply.id, amount = reply.amount, "razorpay order created");

        Ok(PaymentOrder {
            order_id: reply.id,
            amount_minor: reply.amount,
            currency: reply.currency,
            receipt: reply.receipt,
        })
    }

    fn public_key(&self) -> &str {
        &self.key_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn config() -> PaymentConfig {
        PaymentConfig {
            key_id: "rzp_test_key".into(),
            key_secret: "secret".into(),
            base_url: "http://127.0.0.1:9/".into(),
            currency: "INR".into(),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn order_body_carries_course_and_student_notes() {
        let course_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let body = CreateOrderBody {
            amount: 499_900,
            currency: "INR",
            receipt: "receipt_1",
            payment_capture: 1,
            notes: OrderNotes {
                course_id: course_id.to_string(),
                student_id: student_id.to_string(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], 499_900);
        assert_eq!(json["notes"]["course_id"], course_id.to_string());
        assert_eq!(json["notes"]["student_id"], student_id.to_string());
    }

    #[tokio::test]
    async fn rejects_non_positive_amount_before_any_request() {
        let gateway = RazorpayGateway::new(&config()).unwrap();
        assert_eq!(gateway.base_url, "http://127.0.0.1:9");
        let err = gateway
            .create_order(NewOrder {
                amount_minor: 0,
                currency: "INR".into(),
                receipt: "r".into(),
                course_id: Uuid::new_v4(),
                student_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(0)));
    }
}
