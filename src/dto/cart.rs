use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Cart;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub group_id: Option<Uuid>,
    pub quantity: i32,
}

/// Relative quantity adjustment (+1 / -1 buttons).
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub change: i32,
}

/// Absolute quantity replacement (typed-in value).
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartSummary {
    pub cart_id: Uuid,
    pub product_count: usize,
}

/// One line whose requested quantity exceeds currently available stock.
/// Returned as data, not an error, so the UI can offer adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Shortfall {
    pub line_id: Uuid,
    pub product_id: Uuid,
    /// Variant label (color/size/material); empty for ungrouped lines and
    /// for group references that no longer resolve.
    pub variant: String,
    pub name: String,
    pub requested_quantity: i32,
    pub available_quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartSyncData {
    pub cart: Cart,
    pub errors: Vec<Shortfall>,
}
