use sea_orm::entity::prelude::*;

/// Append-only evidence of verified gateway callbacks. One row per
/// verification; rows are never updated or deleted. `order_id` carries no
/// foreign key on purpose: the record must be writable before the order is
/// re-checked, and must survive whatever happens to the order afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
