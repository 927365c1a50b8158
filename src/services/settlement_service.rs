//! Settlement: turn a verified gateway callback into a paid order and a
//! closed cart.
//!
//! No transaction spans these steps; the step order is the consistency
//! mechanism. Payment evidence lands before the paid flag, so a crash in
//! between leaves recoverable proof of payment without a false "paid"
//! state. The cart closes last, so a crash before that leaves a paid order
//! with a still-open cart, which reconciliation can close later. The
//! reverse (closed cart, unpaid order) must never be possible.

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::OrmConn,
    dto::payment::{SettlementData, VerifyCallbackRequest},
    entity::{
        carts::{Column as CartCol, Entity as Carts},
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

/// Verify the callback and finalize the order.
///
/// The gateway retries callbacks, so a second invocation for the same
/// payment must succeed: marking an already-paid order paid and closing an
/// already-closed cart are no-ops. Only the payment record duplicates,
/// which the append-only ledger accepts.
pub async fn settle(
    state: &AppState,
    payload: VerifyCallbackRequest,
) -> AppResult<ApiResponse<SettlementData>> {
    if let Err(err) = payment_service::verify_signature(
        &state.payment_secret,
        &payload.gateway_order_id,
        &payload.gateway_payment_id,
        &payload.gateway_signature,
    ) {
        // Security event: forged or corrupted callback. Rejected before
        // anything is written.
        tracing::warn!(
            order_id = %payload.order_id,
            gateway_order_id = %payload.gateway_order_id,
            "payment callback signature rejected"
        );
        return Err(err);
    }

    record_payment(&state.orm, &payload).await?;

    let order = mark_order_paid(&state.orm, payload.order_id).await?;

    deactivate_cart(&state.orm, order.cart_id).await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        AuditAction::PaymentSettled,
        Some(serde_json::json!({
            "order_id": order.id,
            "gateway_payment_id": payload.gateway_payment_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::new(
        "Payment verified successfully",
        SettlementData {
            order_id: order.id,
            payment_status: order.payment_status,
        },
    ))
}

/// Append the payment evidence. Never upserts; every verified callback is
/// retained, including gateway retries.
pub async fn record_payment(
    orm: &OrmConn,
    payload: &VerifyCallbackRequest,
) -> AppResult<PaymentModel> {
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(payload.order_id),
        gateway_order_id: Set(payload.gateway_order_id.clone()),
        gateway_payment_id: Set(payload.gateway_payment_id.clone()),
        gateway_signature: Set(payload.gateway_signature.clone()),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    Ok(payment)
}

/// Flip the order to paid. Fails NotFound if the order vanished since the
/// callback was issued; an already-paid order is flipped again harmlessly.
pub async fn mark_order_paid(orm: &OrmConn, order_id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(order_id)
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = order.into();
    active.payment_status = Set("paid".into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(orm).await?;

    Ok(order)
}

/// Close the source cart. Idempotent; a cart that is already inactive, or
/// gone entirely, is left as-is.
pub async fn deactivate_cart(orm: &OrmConn, cart_id: Uuid) -> AppResult<()> {
    Carts::update_many()
        .col_expr(CartCol::Status, Expr::value("inactive"))
        .col_expr(CartCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(CartCol::Id.eq(cart_id))
        .exec(orm)
        .await?;

    Ok(())
}
