//! Pre-checkout inventory reconciliation. Read-only and repeatable: the
//! user retries checkout after adjusting quantities, so this gate mutates
//! nothing.

use crate::{
    dto::cart::{CartSyncData, Shortfall},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartLine,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

/// Resolve the caller's active cart and report every line whose requested
/// quantity exceeds what the inventory currently has.
pub async fn sync_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSyncData>> {
    let cart_model = cart_service::find_active_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = cart_service::resolve_cart(&state.orm, &cart_model).await?;
    let errors = find_shortfalls(&cart.products);

    Ok(ApiResponse::new(
        "Successfully retrieved cart",
        CartSyncData { cart, errors },
    ))
}

/// Compare each resolved line against current stock.
///
/// A line referencing a group that no longer exists is reported with
/// available quantity 0, as is an ungrouped line on a product without a
/// flat quantity. Lines that fit within stock are not reported.
pub fn find_shortfalls(lines: &[CartLine]) -> Vec<Shortfall> {
    lines
        .iter()
        .filter_map(|line| {
            let mode = line.product.pricing_mode();
            let available = mode.available(line.group_id);

            if line.quantity <= available {
                return None;
            }

            let variant = line
                .group_id
                .and_then(|id| line.product.group(id))
                .map(|grp| grp.label())
                .unwrap_or_default();

            Some(Shortfall {
                line_id: line.id,
                product_id: line.product.id,
                variant,
                name: line.product.name.clone(),
                requested_quantity: line.quantity,
                available_quantity: available,
            })
        })
        .collect()
}
