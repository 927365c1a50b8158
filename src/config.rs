use std::env;

use crate::gateway::GatewayConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let gateway = GatewayConfig {
            base_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            key_id: env::var("PAYMENT_KEY_ID")?,
            key_secret: env::var("PAYMENT_KEY_SECRET")?,
        };

        Ok(Self {
            port,
            database_url,
            host,
            gateway,
        })
    }
}
