use hmac::{Hmac, Mac};
use sea_orm::EntityTrait;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    dto::payment::{CreateIntentRequest, IntentData},
    entity::orders::Entity as Orders,
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
};

type HmacSha256 = Hmac<Sha256>;

/// Only INR is collected today; the gateway amount is always the order
/// total converted to paise.
pub const CURRENCY: &str = "INR";

/// Open a gateway-side intent for the order's total. Reads the order and
/// talks to the processor; mutates nothing, so a failure here is safe to
/// retry.
pub async fn create_intent(
    state: &AppState,
    payload: CreateIntentRequest,
) -> AppResult<ApiResponse<IntentData>> {
    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let amount = order.total * 100;
    let receipt = receipt_for(order.id);

    let intent = state
        .gateway
        .create_intent(amount, CURRENCY, &receipt)
        .await
        .map_err(|err| AppError::GatewayUnavailable(err.to_string()))?;

    Ok(ApiResponse::new(
        "Payment intent created",
        IntentData {
            gateway_order_id: intent.intent_id,
            amount: intent.amount,
            currency: intent.currency,
        },
    ))
}

/// Verify a gateway callback signature: HMAC-SHA256 over
/// `intent_id + "|" + payment_id`, hex-encoded.
///
/// This is a security boundary. Comparison goes through
/// `Mac::verify_slice`, which is constant-time, and callers must reject
/// before any database write.
pub fn verify_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
) -> AppResult<()> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(anyhow::anyhow!("invalid payment secret: {err}")))?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());

    let provided = hex::decode(signature).map_err(|_| AppError::SignatureInvalid)?;

    mac.verify_slice(&provided)
        .map_err(|_| AppError::SignatureInvalid)
}

/// Compute the signature the gateway sends for a given intent/payment
/// pair. The counterpart of [`verify_signature`]; used by tests.
pub fn sign(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn receipt_for(order_id: Uuid) -> String {
    let id = order_id.to_string();
    format!("rcp_{}", &id[..8])
}
