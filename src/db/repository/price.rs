use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Price Repository
// ============================================================================

const PRICE_ROW_ID: i64 = 1;

pub struct PriceRepository;

impl PriceRepository {
    pub async fn get(pool: &SqlitePool) -> AppResult<Option<Price>> {
        sqlx::query_as::<_, Price>("SELECT id, amount FROM prices WHERE id = ?")
            .bind(PRICE_ROW_ID)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn upsert(pool: &SqlitePool, amount: f64) -> AppResult<Price> {
        sqlx::query_as::<_, Price>(
            r#"
            INSERT INTO prices (id, amount)
            VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET amount = excluded.amount
            RETURNING id, amount
            "#,
        )
        .bind(PRICE_ROW_ID)
        .bind(amount)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
