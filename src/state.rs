use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    notifier::Notifier,
    payments::{OrderGateway, PaymentVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn OrderGateway>,
    pub verifier: PaymentVerifier,
    pub notifier: Arc<dyn Notifier>,
}
