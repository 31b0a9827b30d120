use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{models::TimeRangeSettings, TimeRangeSettingsRepository};
use crate::error::AppError;
use crate::routes::auth::AdminUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_settings).post(update_settings))
}

/// Current business hours. Falls back to the built-in defaults when the
/// admin has never saved any; reading never writes the defaults back.
async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimeRangeSettings>, AppError> {
    let settings = TimeRangeSettingsRepository::get_or_default(&state.db).await?;
    Ok(Json(settings))
}

/// Replace the business hours (admin). Takes effect on the next schedule
/// generation run; already-generated slots are left as they are.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<TimeRangeSettings>,
) -> Result<Json<TimeRangeSettings>, AppError> {
    if request.weekday_start >= request.weekday_end || request.weekend_start >= request.weekend_end
    {
        return Err(AppError::BadRequest(
            "Opening hour must be before closing hour".to_string(),
        ));
    }
    if [
        request.weekday_start,
        request.weekday_end,
        request.weekend_start,
        request.weekend_end,
    ]
    .iter()
    .any(|h| !(0..=24).contains(h))
    {
        return Err(AppError::BadRequest(
            "Hours must be between 0 and 24".to_string(),
        ));
    }

    let saved = TimeRangeSettingsRepository::upsert(&state.db, &request).await?;
    tracing::info!(
        "Business hours updated: weekdays {}-{}, weekends {}-{}",
        saved.weekday_start,
        saved.weekday_end,
        saved.weekend_start,
        saved.weekend_end
    );
    Ok(Json(saved))
}
