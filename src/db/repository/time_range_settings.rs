use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Time Range Settings Repository
// ============================================================================

/// The settings table holds at most one row, keyed by id 1.
const SETTINGS_ROW_ID: i64 = 1;

pub struct TimeRangeSettingsRepository;

impl TimeRangeSettingsRepository {
    pub async fn get(pool: &SqlitePool) -> AppResult<Option<TimeRangeSettings>> {
        sqlx::query_as::<_, TimeRangeSettings>(
            r#"
            SELECT weekday_start, weekday_end, weekend_start, weekend_end
            FROM time_range_settings
            WHERE id = ?
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// The stored row, or the hardcoded defaults when none exists. Reading
    /// never persists the defaults.
    pub async fn get_or_default(pool: &SqlitePool) -> AppResult<TimeRangeSettings> {
        Ok(Self::get(pool).await?.unwrap_or_default())
    }

    pub async fn upsert(
        pool: &SqlitePool,
        settings: &TimeRangeSettings,
    ) -> AppResult<TimeRangeSettings> {
        sqlx::query_as::<_, TimeRangeSettings>(
            r#"
            INSERT INTO time_range_settings (id, weekday_start, weekday_end, weekend_start, weekend_end)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                weekday_start = excluded.weekday_start,
                weekday_end = excluded.weekday_end,
                weekend_start = excluded.weekend_start,
                weekend_end = excluded.weekend_end
            RETURNING weekday_start, weekday_end, weekend_start, weekend_end
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(settings.weekday_start)
        .bind(settings.weekday_end)
        .bind(settings.weekend_start)
        .bind(settings.weekend_end)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
