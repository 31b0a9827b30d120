use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{
    models::{ROLE_ADMIN, ROLE_USER},
    CreateUser, User, UserRepository,
};
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/session", get(session))
        .route("/signout", post(signout))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user account. Every self-registered account gets the
/// regular user role; admins come from seeding.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if request.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if UserRepository::find_by_email(&state.db, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = AuthService::hash_password(&request.password)?;
    let user = UserRepository::create(
        &state.db,
        CreateUser {
            email,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            password_hash,
            role: ROLE_USER.to_string(),
            picture: String::new(),
        },
    )
    .await?;

    tracing::info!("New account registered: {}", user.email);

    let token = AuthService::create_jwt(&state, &user.id)?;
    Ok(Json(SessionResponse { token, user }))
}

/// Exchange email + password for a bearer token. Wrong email and wrong
/// password return the same error so the endpoint doesn't leak which
/// accounts exist.
async fn signin(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = request.email.trim().to_lowercase();

    let user = UserRepository::find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !AuthService::verify_password(&request.password, &user.password_hash)? {
        tracing::debug!("Failed signin attempt for {}", email);
        return Err(AppError::Unauthorized);
    }

    let token = AuthService::create_jwt(&state, &user.id)?;
    Ok(Json(SessionResponse { token, user }))
}

/// Current session info for the bearer token
async fn session(AuthUser(user): AuthUser) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({ "user": user })))
}

/// Sign out. Sessions are stateless JWTs, so there is nothing to clear on
/// the server; the endpoint exists so the frontend has a stable call and a
/// place for server-side invalidation if it's ever needed.
async fn signout() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({ "message": "Signed out" })))
}

// ============================================================================
// Auth Extractors
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for authenticated user
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let user = AuthService::get_user_from_token(state, token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to get user from token: {:?}", e);
                e
            })?;

        tracing::debug!("Authenticated user: {}", user.id);
        Ok(AuthUser(user))
    }
}

/// Extractor for an authenticated user with the admin role
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            tracing::debug!("User {} is not an admin", user.id);
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{body_json, request, test_state};
    use http::StatusCode;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .nest("/api/auth", router())
            .with_state(state)
    }

    #[tokio::test]
    async fn signup_then_signin_round_trip() {
        let state = test_state().await;
        let app = app(state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": "Client@Example.com",
                    "password": "hunter2hunter2",
                    "firstName": "Sam",
                    "lastName": "Ortiz"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["token"].as_str().is_some());
        // Email is normalized and the hash never leaves the server.
        assert_eq!(body["user"]["email"], "client@example.com");
        assert!(body["user"].get("passwordHash").is_none());
        assert_eq!(body["user"]["role"], ROLE_USER);

        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/signin",
                None,
                Some(serde_json::json!({
                    "email": "client@example.com",
                    "password": "hunter2hunter2"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let state = test_state().await;
        let app = app(state);

        let payload = serde_json::json!({
            "email": "dup@example.com",
            "password": "hunter2hunter2"
        });
        let first = app
            .clone()
            .oneshot(request("POST", "/api/auth/signup", None, Some(payload.clone())))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(request("POST", "/api/auth/signup", None, Some(payload)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signin_with_wrong_password_is_unauthorized() {
        let state = test_state().await;
        let app = app(state);

        app.clone()
            .oneshot(request(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": "sam@example.com",
                    "password": "hunter2hunter2"
                })),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/signin",
                None,
                Some(serde_json::json!({
                    "email": "sam@example.com",
                    "password": "wrong-password"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_requires_a_bearer_token() {
        let state = test_state().await;
        let app = app(state);

        let response = app
            .oneshot(request("GET", "/api/auth/session", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
