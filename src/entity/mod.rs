pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod orders;
pub mod payments;
pub mod product_groups;
pub mod products;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use product_groups::Entity as ProductGroups;
pub use products::Entity as Products;
