use std::sync::Arc;

use crate::db::{DbPool, OrmConn};
use crate::gateway::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Shared secret used to verify gateway callback signatures.
    pub payment_secret: String,
}
