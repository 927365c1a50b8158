use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One variant combination of a product (color/size/material) with its own
/// price and stock.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantGroup {
    pub id: Uuid,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub price: i64,
    pub quantity: i32,
}

impl VariantGroup {
    /// Human-readable variant label: non-empty attributes joined with ", ".
    pub fn label(&self) -> String {
        [&self.color, &self.size, &self.material]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub selling_price: i64,
    /// Per-unit absolute discount, not a percentage.
    pub discount: i64,
    /// Flat stock; authoritative only when the product has no groups.
    pub quantity: Option<i32>,
    pub groups: Vec<VariantGroup>,
    pub created_at: DateTime<Utc>,
}

/// How a product's price and stock are resolved. A product is either
/// ungrouped (flat quantity authoritative) or grouped (each group's
/// quantity authoritative for that variant combination).
#[derive(Debug)]
pub enum PricingMode<'a> {
    Flat {
        price: i64,
        quantity: Option<i32>,
    },
    Grouped {
        /// Selling price used when a referenced group no longer exists.
        fallback_price: i64,
        groups: &'a [VariantGroup],
    },
}

impl Product {
    pub fn pricing_mode(&self) -> PricingMode<'_> {
        if self.groups.is_empty() {
            PricingMode::Flat {
                price: self.selling_price,
                quantity: self.quantity,
            }
        } else {
            PricingMode::Grouped {
                fallback_price: self.selling_price,
                groups: &self.groups,
            }
        }
    }

    pub fn group(&self, group_id: Uuid) -> Option<&VariantGroup> {
        self.groups.iter().find(|grp| grp.id == group_id)
    }
}

impl PricingMode<'_> {
    /// Stock available to a cart line. A group reference that no longer
    /// resolves counts as out of stock, as does a missing flat quantity.
    pub fn available(&self, group_ref: Option<Uuid>) -> i32 {
        match (group_ref, self) {
            (Some(id), PricingMode::Grouped { groups, .. }) => groups
                .iter()
                .find(|grp| grp.id == id)
                .map_or(0, |grp| grp.quantity),
            (Some(_), PricingMode::Flat { .. }) => 0,
            (None, PricingMode::Flat { quantity, .. }) => quantity.unwrap_or(0),
            (None, PricingMode::Grouped { .. }) => 0,
        }
    }

    /// Effective unit price for a cart line. The group price wins when the
    /// referenced group exists; anything else falls back to the selling
    /// price.
    pub fn unit_price(&self, group_ref: Option<Uuid>) -> i64 {
        match self {
            PricingMode::Flat { price, .. } => *price,
            PricingMode::Grouped {
                fallback_price,
                groups,
            } => group_ref
                .and_then(|id| groups.iter().find(|grp| grp.id == id))
                .map_or(*fallback_price, |grp| grp.price),
        }
    }
}

/// A cart line with its product resolved against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub group_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub products: Vec<CartLine>,
}

/// Shipping address as copied onto an order, so deleting the address-book
/// entry cannot corrupt historical orders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingSnapshot {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub pin_code: String,
    pub state: String,
    pub landmark: Option<String>,
    pub address_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub address: ShippingSnapshot,
    pub price: i64,
    pub discount: i64,
    pub shipping_charges: i64,
    pub total: i64,
    pub payment_status: String,
    pub order_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(color: Option<&str>, size: Option<&str>, material: Option<&str>) -> VariantGroup {
        VariantGroup {
            id: Uuid::new_v4(),
            color: color.map(String::from),
            size: size.map(String::from),
            material: material.map(String::from),
            price: 100,
            quantity: 1,
        }
    }

    #[test]
    fn label_joins_present_attributes() {
        let grp = group(Some("Black"), Some("XL"), Some("Cotton"));
        assert_eq!(grp.label(), "Black, XL, Cotton");
    }

    #[test]
    fn label_omits_empty_attributes() {
        assert_eq!(group(Some("Red"), None, None).label(), "Red");
        assert_eq!(group(None, Some("M"), Some("Wool")).label(), "M, Wool");
        assert_eq!(group(None, None, None).label(), "");
        assert_eq!(group(Some(""), Some("S"), None).label(), "S");
    }

    #[test]
    fn flat_product_resolves_flat_mode() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Plain".into(),
            category: None,
            brand: None,
            description: None,
            selling_price: 250,
            discount: 0,
            quantity: Some(7),
            groups: vec![],
            created_at: Utc::now(),
        };

        let mode = product.pricing_mode();
        assert_eq!(mode.unit_price(None), 250);
        assert_eq!(mode.available(None), 7);
        // A stale group reference against an ungrouped product is out of stock.
        assert_eq!(mode.available(Some(Uuid::new_v4())), 0);
    }

    #[test]
    fn missing_flat_quantity_is_out_of_stock_not_unlimited() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "No stock field".into(),
            category: None,
            brand: None,
            description: None,
            selling_price: 250,
            discount: 0,
            quantity: None,
            groups: vec![],
            created_at: Utc::now(),
        };

        assert_eq!(product.pricing_mode().available(None), 0);
    }

    #[test]
    fn group_price_overrides_selling_price() {
        let grp = group(Some("Blue"), None, None);
        let group_id = grp.id;
        let product = Product {
            id: Uuid::new_v4(),
            name: "Variants".into(),
            category: None,
            brand: None,
            description: None,
            selling_price: 999,
            discount: 0,
            quantity: None,
            groups: vec![grp],
            created_at: Utc::now(),
        };

        let mode = product.pricing_mode();
        assert_eq!(mode.unit_price(Some(group_id)), 100);
        assert_eq!(mode.available(Some(group_id)), 1);
        // Deleted group: price falls back, stock does not.
        assert_eq!(mode.unit_price(Some(Uuid::new_v4())), 999);
        assert_eq!(mode.available(Some(Uuid::new_v4())), 0);
        assert_eq!(mode.available(None), 0);
    }
}
