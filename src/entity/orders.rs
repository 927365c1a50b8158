use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Source cart. At most one order exists per (user_id, cart_id);
    /// re-checkout updates the row instead of inserting a second one.
    pub cart_id: Uuid,

    // Shipping address copied from the address book at checkout time, so
    // deleting the address-book entry cannot corrupt the order.
    pub ship_name: String,
    pub ship_phone: String,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_pin_code: String,
    pub ship_state: String,
    pub ship_landmark: Option<String>,
    pub ship_address_type: Option<String>,

    // Pricing frozen at checkout time.
    pub price: i64,
    pub discount: i64,
    pub shipping_charges: i64,
    pub total: i64,

    /// "not_paid" or "paid". Flipped to "paid" only by settlement.
    pub payment_status: String,
    /// pending | processing | shipped | delivered | cancelled | refunded | failed
    pub order_status: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::carts::Entity",
        from = "Column::CartId",
        to = "super::carts::Column::Id"
    )]
    Carts,
}

impl Related<super::carts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Carts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
