//! HTTP client for the external payment processor.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Configuration for the payment gateway account.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API address, e.g. `"https://api.razorpay.com"`.
    pub base_url: String,

    /// API key id, sent as the basic-auth username.
    pub key_id: String,

    /// API key secret. Also the HMAC key for callback verification.
    pub key_secret: String,
}

/// A gateway-side handle for a pending charge, created before the buyer pays.
#[derive(Debug, Clone)]
pub struct GatewayIntent {
    pub intent_id: String,
    /// Amount in the minor currency unit.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Opens payment intents with the external processor.
///
/// Behind a trait so tests can substitute a stub; the processor is never
/// reachable from CI.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an intent for `amount` (minor currency unit). Does not touch
    /// any local state.
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayIntent, GatewayError>;
}

/// Live gateway client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    http: Client,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayIntent, GatewayError> {
        let url = format!("{}/v1/orders", self.config.base_url);

        let body = serde_json::json!({
            "amount": amount,
            "currency": currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GatewayError::UnexpectedResponse(format!(
                "intent request failed with status {status}: {text}"
            )));
        }

        let parsed: IntentResponse = response.json().await?;

        Ok(GatewayIntent {
            intent_id: parsed.id,
            amount: parsed.amount,
            currency: parsed.currency,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    amount: i64,
    currency: String,
}
