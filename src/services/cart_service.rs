use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::OrmConn,
    dto::cart::{AddToCartRequest, CartSummary, SetQuantityRequest, UpdateQuantityRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as ItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine},
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

/// Find the user's single active cart, if one exists.
pub async fn find_active_cart(orm: &OrmConn, user_id: Uuid) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user_id))
                .add(CartCol::Status.eq("active")),
        )
        .one(orm)
        .await?;
    Ok(cart)
}

/// The cart is created lazily on the first add-to-cart action; every caller
/// that needs a mutable cart goes through here instead of checking on its
/// own.
pub async fn get_or_create_active_cart(orm: &OrmConn, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = find_active_cart(orm, user_id).await? {
        return Ok(cart);
    }

    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;

    Ok(cart)
}

/// Resolve a cart's lines against the catalog. Fails NotFound when a line
/// references a product that no longer exists.
pub async fn resolve_cart(orm: &OrmConn, cart: &CartModel) -> AppResult<Cart> {
    let items = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .order_by_asc(ItemCol::CreatedAt)
        .all(orm)
        .await?;

    let mut product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    product_ids.sort();
    product_ids.dedup();

    let products = product_service::load_products(orm, &product_ids).await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = products
            .get(&item.product_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        lines.push(CartLine {
            id: item.id,
            product,
            group_id: item.group_id,
            quantity: item.quantity,
        });
    }

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        status: cart.status.clone(),
        products: lines,
    })
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart_model = find_active_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = resolve_cart(&state.orm, &cart_model).await?;

    Ok(ApiResponse::new("Successfully retrieved cart", cart))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = product_service::load_product(&state.orm, payload.product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;

    // Availability is checked up front; the exact requested quantity is
    // re-validated by reconciliation at checkout time.
    let available = product.pricing_mode().available(payload.group_id);
    if available <= 0 {
        return Err(AppError::BadRequest(
            "Product currently out of stock".to_string(),
        ));
    }

    let cart = get_or_create_active_cart(&state.orm, user.user_id).await?;

    let items = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .all(&state.orm)
        .await?;

    let product_count = if find_matching_line(&items, payload.product_id, payload.group_id)
        .is_some()
    {
        // The line is already in the cart; quantity changes go through the
        // dedicated quantity endpoints.
        items.len()
    } else {
        CartItemActive {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(payload.product_id),
            group_id: Set(payload.group_id),
            quantity: Set(payload.quantity),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;

        items.len() + 1
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartUpdate,
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "group_id": payload.group_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::new(
        "OK",
        CartSummary {
            cart_id: cart.id,
            product_count,
        },
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
) -> AppResult<ApiResponse<CartSummary>> {
    let cart = find_active_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(ItemCol::Id.eq(line_id))
                .add(ItemCol::CartId.eq(cart.id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    let product_count = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .count(&state.orm)
        .await? as usize;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartRemove,
        Some(serde_json::json!({ "line_id": line_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::new(
        "Removed from cart",
        CartSummary {
            cart_id: cart.id,
            product_count,
        },
    ))
}

/// Relative quantity change (`+1` / `-1` controls).
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    change_quantity(state, user, line_id, QuantityTarget::Delta(payload.change)).await
}

/// Absolute quantity replacement.
pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    change_quantity(
        state,
        user,
        line_id,
        QuantityTarget::Absolute(payload.quantity),
    )
    .await
}

enum QuantityTarget {
    Delta(i32),
    Absolute(i32),
}

async fn change_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    target: QuantityTarget,
) -> AppResult<ApiResponse<CartSummary>> {
    let cart = find_active_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let item = CartItems::find()
        .filter(
            Condition::all()
                .add(ItemCol::Id.eq(line_id))
                .add(ItemCol::CartId.eq(cart.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let product = product_service::load_product(&state.orm, item.product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let available = product.pricing_mode().available(item.group_id);

    let new_quantity = apply_target(item.quantity, target)?;

    if new_quantity > available {
        return Err(AppError::BadRequest(
            "Quantity exceeds available stock".to_string(),
        ));
    }
    if new_quantity <= 0 {
        return Err(AppError::BadRequest(
            "Quantity of product in the cart can't be zero/negative".to_string(),
        ));
    }

    let mut active: CartItemActive = item.into();
    active.quantity = Set(new_quantity);
    active.update(&state.orm).await?;

    let product_count = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .count(&state.orm)
        .await? as usize;

    Ok(ApiResponse::new(
        "Updated the quantity",
        CartSummary {
            cart_id: cart.id,
            product_count,
        },
    ))
}

/// The delta comes straight from the request body, so the addition must
/// not be allowed to overflow.
fn apply_target(current: i32, target: QuantityTarget) -> AppResult<i32> {
    match target {
        QuantityTarget::Delta(change) => current
            .checked_add(change)
            .ok_or_else(|| AppError::BadRequest("Quantity out of range".to_string())),
        QuantityTarget::Absolute(quantity) => Ok(quantity),
    }
}

/// A line matches when the product ids agree and, if both the line and the
/// request carry a group id, the groups agree too.
fn find_matching_line(
    items: &[CartItemModel],
    product_id: Uuid,
    group_id: Option<Uuid>,
) -> Option<&CartItemModel> {
    items.iter().find(|item| {
        if item.product_id != product_id {
            return false;
        }
        match (item.group_id, group_id) {
            (Some(existing), Some(requested)) => existing == requested,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(product_id: Uuid, group_id: Option<Uuid>) -> CartItemModel {
        CartItemModel {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id,
            group_id,
            quantity: 1,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn matching_line_requires_equal_groups_when_both_present() {
        let product_id = Uuid::new_v4();
        let group_a = Uuid::new_v4();
        let group_b = Uuid::new_v4();
        let items = vec![item(product_id, Some(group_a))];

        assert!(find_matching_line(&items, product_id, Some(group_a)).is_some());
        assert!(find_matching_line(&items, product_id, Some(group_b)).is_none());
        assert!(find_matching_line(&items, Uuid::new_v4(), Some(group_a)).is_none());
    }

    #[test]
    fn extreme_delta_is_rejected_not_wrapped() {
        let result = apply_target(1, QuantityTarget::Delta(i32::MAX));
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = apply_target(-1, QuantityTarget::Delta(i32::MIN));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn ordinary_deltas_apply() {
        assert_eq!(apply_target(2, QuantityTarget::Delta(1)).unwrap(), 3);
        assert_eq!(apply_target(2, QuantityTarget::Delta(-1)).unwrap(), 1);
        assert_eq!(apply_target(2, QuantityTarget::Absolute(5)).unwrap(), 5);
    }

    #[test]
    fn matching_line_ignores_groups_when_either_is_absent() {
        let product_id = Uuid::new_v4();
        let items = vec![item(product_id, None)];

        assert!(find_matching_line(&items, product_id, None).is_some());
        assert!(find_matching_line(&items, product_id, Some(Uuid::new_v4())).is_some());
    }
}
