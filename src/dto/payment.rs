use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIntentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntentData {
    pub gateway_order_id: String,
    /// Amount in the gateway's minor currency unit (total * 100).
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyCallbackRequest {
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementData {
    pub order_id: Uuid,
    pub payment_status: String,
}
