//! Cart pricing. Pure and deterministic: the same resolved snapshot must
//! produce the same breakdown whether it is computed for UI display or at
//! order-creation time, or the two totals will visibly disagree.

use crate::models::CartLine;

/// Flat shipping charge. Extension point; carrier-rated shipping would
/// plug in here before order creation.
pub const SHIPPING_CHARGES: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: i64,
    pub discount: i64,
    pub shipping: i64,
    pub total: i64,
}

/// Price a resolved cart. Unit price follows the line's variant group when
/// it resolves, otherwise the product's selling price; the per-unit
/// discount is summed regardless of which price tier applied.
pub fn price_cart(lines: &[CartLine]) -> PriceBreakdown {
    let mut subtotal: i64 = 0;
    let mut discount: i64 = 0;

    for line in lines {
        let mode = line.product.pricing_mode();
        let quantity = i64::from(line.quantity);

        subtotal += mode.unit_price(line.group_id) * quantity;
        discount += line.product.discount * quantity;
    }

    let shipping = SHIPPING_CHARGES;

    PriceBreakdown {
        subtotal,
        discount,
        shipping,
        total: subtotal - discount + shipping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, VariantGroup};
    use chrono::Utc;
    use uuid::Uuid;

    fn product(selling_price: i64, discount: i64, groups: Vec<VariantGroup>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Test".into(),
            category: None,
            brand: None,
            description: None,
            selling_price,
            discount,
            quantity: Some(10),
            groups,
            created_at: Utc::now(),
        }
    }

    fn line(product: Product, group_id: Option<Uuid>, quantity: i32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            product,
            group_id,
            quantity,
        }
    }

    #[test]
    fn grouped_line_uses_group_price_and_per_unit_discount() {
        let group = VariantGroup {
            id: Uuid::new_v4(),
            color: Some("Black".into()),
            size: None,
            material: None,
            price: 500,
            quantity: 5,
        };
        let group_id = group.id;
        let lines = vec![line(product(700, 50, vec![group]), Some(group_id), 2)];

        let breakdown = price_cart(&lines);
        assert_eq!(breakdown.subtotal, 1000);
        assert_eq!(breakdown.discount, 100);
        assert_eq!(breakdown.shipping, 0);
        assert_eq!(breakdown.total, 900);
    }

    #[test]
    fn stale_group_reference_falls_back_to_selling_price() {
        let group = VariantGroup {
            id: Uuid::new_v4(),
            color: None,
            size: Some("L".into()),
            material: None,
            price: 500,
            quantity: 5,
        };
        let lines = vec![line(product(700, 0, vec![group]), Some(Uuid::new_v4()), 3)];

        assert_eq!(price_cart(&lines).subtotal, 2100);
    }

    #[test]
    fn flat_line_uses_selling_price() {
        let lines = vec![
            line(product(300, 20, vec![]), None, 1),
            line(product(150, 0, vec![]), None, 4),
        ];

        let breakdown = price_cart(&lines);
        assert_eq!(breakdown.subtotal, 300 + 600);
        assert_eq!(breakdown.discount, 20);
        assert_eq!(breakdown.total, 880);
    }

    #[test]
    fn empty_cart_prices_to_zero() {
        let breakdown = price_cart(&[]);
        assert_eq!(breakdown.subtotal, 0);
        assert_eq!(breakdown.discount, 0);
        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn repricing_the_same_snapshot_is_deterministic() {
        let group = VariantGroup {
            id: Uuid::new_v4(),
            color: Some("Red".into()),
            size: Some("M".into()),
            material: None,
            price: 499,
            quantity: 9,
        };
        let group_id = group.id;
        let lines = vec![
            line(product(999, 49, vec![group]), Some(group_id), 3),
            line(product(120, 10, vec![]), None, 2),
        ];

        assert_eq!(price_cart(&lines), price_cart(&lines));
    }
}
