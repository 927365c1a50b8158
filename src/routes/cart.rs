use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddToCartRequest, CartSummary, CartSyncData, SetQuantityRequest, UpdateQuantityRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::{cart_service, reconcile_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart))
        .route("/sync", get(sync_cart))
        .route(
            "/{line_id}",
            patch(update_quantity).put(set_quantity).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Resolved active cart for the current user", body = ApiResponse<Cart>),
        (status = 404, description = "No active cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let response = cart_service::get_cart(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/cart/sync",
    responses(
        (status = 200, description = "Resolved cart plus per-line stock shortfalls", body = ApiResponse<CartSyncData>),
        (status = 404, description = "No active cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn sync_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartSyncData>>> {
    let response = reconcile_service::sync_cart(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a line to the active cart, creating the cart if needed", body = ApiResponse<CartSummary>),
        (status = 400, description = "Out of stock or invalid quantity"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let response = cart_service::add_item(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{line_id}",
    params(
        ("line_id" = Uuid, Path, description = "Cart line ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Adjust a line's quantity by a delta", body = ApiResponse<CartSummary>),
        (status = 400, description = "Quantity out of range for available stock"),
        (status = 404, description = "Line not found in the active cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let response = cart_service::update_quantity(&state, &user, line_id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/cart/{line_id}",
    params(
        ("line_id" = Uuid, Path, description = "Cart line ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Replace a line's quantity", body = ApiResponse<CartSummary>),
        (status = 400, description = "Quantity out of range for available stock"),
        (status = 404, description = "Line not found in the active cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let response = cart_service::set_quantity(&state, &user, line_id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{line_id}",
    params(
        ("line_id" = Uuid, Path, description = "Cart line ID")
    ),
    responses(
        (status = 200, description = "Remove a line from the active cart", body = ApiResponse<CartSummary>),
        (status = 404, description = "Line not found in the active cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let response = cart_service::remove_item(&state, &user, line_id).await?;
    Ok(Json(response))
}
