use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::PriceRepository;
use crate::error::AppError;
use crate::routes::auth::AdminUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_price).put(update_price))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
}

/// The haircut price; zero until an admin has set one.
async fn get_price(State(state): State<Arc<AppState>>) -> Result<Json<PriceResponse>, AppError> {
    let amount = PriceRepository::get(&state.db)
        .await?
        .map(|p| p.amount)
        .unwrap_or(0.0);
    Ok(Json(PriceResponse { price: amount }))
}

async fn update_price(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<PriceResponse>,
) -> Result<Json<PriceResponse>, AppError> {
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(AppError::BadRequest(
            "Price must be a non-negative number".to_string(),
        ));
    }

    let saved = PriceRepository::upsert(&state.db, request.price).await?;
    tracing::info!("Price updated to {}", saved.amount);
    Ok(Json(PriceResponse {
        price: saved.amount,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::*;
    use http::StatusCode;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/price", router()).with_state(state)
    }

    #[tokio::test]
    async fn unset_price_reads_as_zero() {
        let state = test_state().await;

        let response = app(state)
            .oneshot(request("GET", "/api/price", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["price"], 0.0);
    }

    #[tokio::test]
    async fn admin_can_set_the_price() {
        let state = test_state().await;
        let (_, admin_token) = seed_admin(&state).await;
        let app = app(state);

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/price",
                Some(&admin_token),
                Some(serde_json::json!({ "price": 35.5 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let fetched = app
            .oneshot(request("GET", "/api/price", None, None))
            .await
            .unwrap();
        let body = body_json(fetched).await;
        assert_eq!(body["price"], 35.5);
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let state = test_state().await;
        let (_, admin_token) = seed_admin(&state).await;

        let response = app(state)
            .oneshot(request(
                "PUT",
                "/api/price",
                Some(&admin_token),
                Some(serde_json::json!({ "price": -1.0 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
