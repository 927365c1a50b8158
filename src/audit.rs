use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Actions recorded in the audit trail. Each knows the table it touches,
/// so call sites cannot mislabel the resource.
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    CartUpdate,
    CartRemove,
    Checkout,
    PaymentSettled,
}

impl AuditAction {
    fn as_str(self) -> &'static str {
        match self {
            AuditAction::CartUpdate => "cart_update",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::Checkout => "checkout",
            AuditAction::PaymentSettled => "payment_settled",
        }
    }

    fn resource(self) -> &'static str {
        match self {
            AuditAction::CartUpdate | AuditAction::CartRemove => "cart_items",
            AuditAction::Checkout | AuditAction::PaymentSettled => "orders",
        }
    }
}

/// Append an audit row. Callers treat failures as non-fatal; settlement and
/// checkout must not be lost to a broken audit table.
pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
