#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use coaching_api::{
    config::{AdminCredentials, AppConfig, PaymentConfig},
    db::run_migrations,
    entity::{courses::ActiveModel as CourseActive, students::ActiveModel as StudentActive},
    middleware::auth::AuthUser,
    notifier::Notifier,
    payments::{GatewayError, NewOrder, OrderGateway, PaymentOrder, PaymentVerifier},
    services::auth_service::hash_password,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tempfile::TempDir;
use uuid::Uuid;

pub const KEY_SECRET: &str = "test_key_secret";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Gateway double that records every order it is asked to open.
#[derive(Default)]
pub struct StubGateway {
    pub orders: Mutex<Vec<NewOrder>>,
    pub fail: bool,
}

impl StubGateway {
    pub fn failing() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn recorded(&self) -> Vec<NewOrder> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderGateway for StubGateway {
    async fn create_order(&self, order: NewOrder) -> Result<PaymentOrder, GatewayError> {
        if self.fail {
            return Err(GatewayError::Rejected {
                status: 401,
                body: "Authentication failed".into(),
            });
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        Ok(PaymentOrder {
            order_id: format!("order_test_{}", orders.len()),
            amount_minor: order.amount_minor,
            currency: order.currency,
            receipt: Some(order.receipt),
        })
    }

    fn public_key(&self) -> &str {
        "rzp_test_key"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
        anyhow::bail!("mail relay unavailable")
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<StubGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        db_max_connections: 1,
        jwt_secret: "test_jwt_secret".into(),
        jwt_ttl_hours: 1,
        institute_name: "Maharishi Coaching".into(),
        frontend_url: None,
        notify_webhook_url: None,
        admin: Some(AdminCredentials {
            username: ADMIN_USERNAME.into(),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        }),
        payment: PaymentConfig {
            key_id: "rzp_test_key".into(),
            key_secret: KEY_SECRET.into(),
            base_url: "http://127.0.0.1:9".into(),
            currency: "INR".into(),
            timeout: Duration::from_secs(1),
        },
    }
}

/// Fresh in-memory database behind a single pooled connection.
pub async fn setup() -> TestApp {
    setup_with(StubGateway::default()).await
}

pub async fn setup_with(gateway: StubGateway) -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .sqlx_logging(false);
    let orm = Database::connect(options).await.unwrap();
    build(orm, gateway).await
}

/// Database file shared by several pooled connections, so writers really
/// race each other. Keep the returned directory alive for the whole test.
pub async fn setup_file_backed(connections: u32) -> (TestApp, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);
    let orm = Database::connect(options).await.unwrap();
    (build(orm, StubGateway::default()).await, dir)
}

async fn build(orm: DatabaseConnection, gateway: StubGateway) -> TestApp {
    run_migrations(&orm).await.unwrap();

    let gateway = Arc::new(gateway);
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        orm,
        config: Arc::new(test_config()),
        gateway: gateway.clone(),
        verifier: PaymentVerifier::new(KEY_SECRET),
        notifier: notifier.clone(),
    };

    TestApp {
        state,
        gateway,
        notifier,
    }
}

/// Confirmations go out on a detached task; wait until `count` have landed.
pub async fn wait_for_sent(
    notifier: &RecordingNotifier,
    count: usize,
) -> Vec<(String, String, String)> {
    for _ in 0..200 {
        let sent = notifier.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} notifications, got {:?}", notifier.sent());
}

/// Six digit code from the most recent verification mail.
pub fn latest_otp(notifier: &RecordingNotifier) -> String {
    let sent = notifier.sent();
    let body = &sent.last().expect("verification mail").2;
    let rest = body.split("code is ").nth(1).expect("code in body");
    rest[..6].to_string()
}

/// Token from the most recent reset link.
pub fn latest_reset_token(notifier: &RecordingNotifier) -> String {
    let sent = notifier.sent();
    let body = &sent.last().expect("reset mail").2;
    let rest = body.split("token=").nth(1).expect("token in body");
    rest[..64].to_string()
}

pub async fn seed_course(state: &AppState, title: &str, price_minor: i64) -> Uuid {
    let now = Utc::now();
    CourseActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(format!("{title} for serious aspirants")),
        duration: Set("3 months".into()),
        faculty: Set("R. Sharma".into()),
        price_minor: Set(price_minor),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .unwrap()
    .id
}

pub async fn seed_student(state: &AppState, name: &str, email: &str) -> Uuid {
    let now = Utc::now();
    StudentActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(Some("+919876543210".into())),
        password_hash: Set("not-a-real-hash".into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .unwrap()
    .id
}

pub fn admin() -> AuthUser {
    AuthUser::admin(ADMIN_USERNAME)
}

pub fn sign(order_id: &str, payment_id: &str) -> String {
    PaymentVerifier::new(KEY_SECRET).sign(order_id, payment_id)
}
