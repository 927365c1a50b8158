use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payment::{CreateIntentRequest, IntentData, SettlementData, VerifyCallbackRequest},
    error::AppResult,
    response::ApiResponse,
    services::{payment_service, settlement_service},
    state::AppState,
};

// No bearer auth here: /verify is called by the gateway, and the signature
// check is the authentication.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_intent))
        .route("/verify", post(verify_callback))
}

#[utoipa::path(
    post,
    path = "/api/payment/create",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Gateway intent for the order's total", body = ApiResponse<IntentData>),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Payment gateway unavailable"),
    ),
    tag = "Payment"
)]
pub async fn create_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> AppResult<Json<ApiResponse<IntentData>>> {
    let response = payment_service::create_intent(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/payment/verify",
    request_body = VerifyCallbackRequest,
    responses(
        (status = 200, description = "Callback verified; order paid and cart closed", body = ApiResponse<SettlementData>),
        (status = 400, description = "Signature verification failed"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Payment"
)]
pub async fn verify_callback(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCallbackRequest>,
) -> AppResult<Json<ApiResponse<SettlementData>>> {
    let response = settlement_service::settle(&state, payload).await?;
    Ok(Json(response))
}
