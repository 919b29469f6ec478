use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub institute_name: String,
    pub frontend_url: Option<String>,
    pub notify_webhook_url: Option<String>,
    pub admin: Option<AdminCredentials>,
    pub payment: PaymentConfig,
}

/// Back-office login. The password is kept only as an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 24);
        let institute_name =
            env::var("INSTITUTE_NAME").unwrap_or_else(|_| "Maharishi Coaching".to_string());

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD_HASH")) {
            (Ok(username), Ok(password_hash)) => Some(AdminCredentials {
                username,
                password_hash,
            }),
            _ => None,
        };

        let payment = PaymentConfig {
            key_id: env::var("RAZORPAY_KEY_ID").context("RAZORPAY_KEY_ID is not set")?,
            key_secret: env::var("RAZORPAY_KEY_SECRET")
                .context("RAZORPAY_KEY_SECRET is not set")?,
            base_url: env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            timeout: Duration::from_secs(parse_or("PAYMENT_GATEWAY_TIMEOUT_SECS", 15)),
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            jwt_secret,
            jwt_ttl_hours,
            institute_name,
            frontend_url: env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            admin,
            payment,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
