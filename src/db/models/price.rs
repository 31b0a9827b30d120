use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Singleton row (id = 1) holding the current service price.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub amount: f64,
}
