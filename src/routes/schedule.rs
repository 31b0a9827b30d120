use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::db::TimeRangeSettingsRepository;
use crate::error::AppError;
use crate::routes::auth::AdminUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(generate))
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub created: usize,
}

/// Rebuild the available-slot inventory for the rolling window (admin).
/// Uses the stored business hours, or the defaults when none are stored.
async fn generate(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<GenerateResponse>, AppError> {
    let settings = TimeRangeSettingsRepository::get_or_default(&state.db).await?;
    let created = state
        .scheduler
        .regenerate(&state.db, &settings, Utc::now())
        .await?;

    tracing::info!("Schedule regenerated by {}: {} slots", admin.email, created);
    Ok(Json(GenerateResponse { created }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{models::STATUS_AVAILABLE, AppointmentRepository};
    use crate::routes::testing::*;
    use http::StatusCode;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .nest("/api/generate-appointments", router())
            .with_state(state)
    }

    #[tokio::test]
    async fn generation_is_admin_only() {
        let state = test_state().await;
        let (_, user_token) = seed_client(&state).await;
        let app = app(state);

        let anonymous = app
            .clone()
            .oneshot(request("POST", "/api/generate-appointments", None, None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let non_admin = app
            .oneshot(request(
                "POST",
                "/api/generate-appointments",
                Some(&user_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(non_admin.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn generation_fills_the_window() {
        let state = test_state().await;
        let (_, admin_token) = seed_admin(&state).await;

        let response = app(state.clone())
            .oneshot(request(
                "POST",
                "/api/generate-appointments",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let created = body["created"].as_u64().unwrap();
        assert!(created > 0);

        let stored = AppointmentRepository::list_by_status(&state.db, STATUS_AVAILABLE)
            .await
            .unwrap();
        assert_eq!(stored.len() as u64, created);
    }
}
