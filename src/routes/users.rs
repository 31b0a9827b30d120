use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{User, UserRepository};
use crate::error::AppError;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users))
        .route("/current", get(current_user))
}

/// Full account list for the admin dashboard.
async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserRepository::list_all(&state.db).await?;
    Ok(Json(users))
}

/// The authenticated user's own profile.
async fn current_user(AuthUser(user): AuthUser) -> Result<Json<User>, AppError> {
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::*;
    use http::StatusCode;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/users", router()).with_state(state)
    }

    #[tokio::test]
    async fn listing_users_is_admin_only() {
        let state = test_state().await;
        let (_, admin_token) = seed_admin(&state).await;
        let (_, user_token) = seed_client(&state).await;
        let app = app(state);

        let forbidden = app
            .clone()
            .oneshot(request("GET", "/api/users", Some(&user_token), None))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request("GET", "/api/users", Some(&admin_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn current_user_reflects_the_token() {
        let state = test_state().await;
        let (user, token) = seed_client(&state).await;

        let response = app(state)
            .oneshot(request("GET", "/api/users/current", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], user.id);
        assert!(body.get("passwordHash").is_none());
    }
}
