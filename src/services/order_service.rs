use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::orders::{CheckoutRequest, OrderList},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses, Model as AddressModel},
        carts::{Column as CartCol, Entity as Carts},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, ShippingSnapshot},
    response::ApiResponse,
    services::{cart_service, pricing},
    state::AppState,
};

/// Freeze the cart into an order with a copied address and a pricing
/// snapshot. Idempotent by (user_id, cart_id): repeat calls converge on one
/// row whose pricing reflects the cart at the latest call.
///
/// Two concurrent calls for the same cart both pass the lookup and race on
/// the final snapshot; the last writer wins. There is deliberately no lock
/// here, and no transaction spans the steps.
pub async fn freeze_order(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    // An order cannot be created without a concrete shipping address; a
    // "default" address is never substituted.
    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(payload.address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // A checkout against a settled or foreign cart is rejected outright.
    let cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(payload.cart_id))
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::Status.eq("active")),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let resolved = cart_service::resolve_cart(&state.orm, &cart).await?;
    let breakdown = pricing::price_cart(&resolved.products);

    let existing = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::CartId.eq(payload.cart_id)),
        )
        .one(&state.orm)
        .await?;

    let order = match existing {
        Some(order) => {
            // Re-checkout after a failed or abandoned payment: replace the
            // address snapshot and pricing, and clear any stale paid flag.
            let mut active: OrderActive = order.into();
            apply_address(&mut active, &address);
            active.price = Set(breakdown.subtotal);
            active.discount = Set(breakdown.discount);
            active.shipping_charges = Set(breakdown.shipping);
            active.total = Set(breakdown.total);
            active.payment_status = Set("not_paid".into());
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            let mut active = OrderActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                cart_id: Set(payload.cart_id),
                ship_name: NotSet,
                ship_phone: NotSet,
                ship_address: NotSet,
                ship_city: NotSet,
                ship_pin_code: NotSet,
                ship_state: NotSet,
                ship_landmark: NotSet,
                ship_address_type: NotSet,
                price: Set(breakdown.subtotal),
                discount: Set(breakdown.discount),
                shipping_charges: Set(breakdown.shipping),
                total: Set(breakdown.total),
                payment_status: Set("not_paid".into()),
                order_status: Set("pending".into()),
                created_at: NotSet,
                updated_at: NotSet,
            };
            apply_address(&mut active, &address);
            active.insert(&state.orm).await?
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::Checkout,
        Some(serde_json::json!({
            "order_id": order.id,
            "cart_id": payload.cart_id,
            "total": order.total,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::new("Order created", order_from_entity(order)))
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    Ok(ApiResponse::new("Ok", OrderList { items: orders }))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::new("OK", order_from_entity(order)))
}

fn apply_address(active: &mut OrderActive, address: &AddressModel) {
    active.ship_name = Set(address.name.clone());
    active.ship_phone = Set(address.phone.clone());
    active.ship_address = Set(address.address.clone());
    active.ship_city = Set(address.city.clone());
    active.ship_pin_code = Set(address.pin_code.clone());
    active.ship_state = Set(address.state.clone());
    active.ship_landmark = Set(address.landmark.clone());
    active.ship_address_type = Set(address.address_type.clone());
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        cart_id: model.cart_id,
        address: ShippingSnapshot {
            name: model.ship_name,
            phone: model.ship_phone,
            address: model.ship_address,
            city: model.ship_city,
            pin_code: model.ship_pin_code,
            state: model.ship_state,
            landmark: model.ship_landmark,
            address_type: model.ship_address_type,
        },
        price: model.price,
        discount: model.discount,
        shipping_charges: model.shipping_charges,
        total: model.total,
        payment_status: model.payment_status,
        order_status: model.order_status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
