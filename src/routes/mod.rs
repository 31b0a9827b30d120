pub mod appointments;
pub mod auth;
pub mod health;
pub mod price;
pub mod schedule;
pub mod settings;
pub mod users;

#[cfg(test)]
pub mod testing {
    //! Shared helpers for exercising routers against an in-memory database.

    use std::sync::Arc;

    use axum::body::Body;
    use axum::response::Response;
    use http::Request;
    use http_body_util::BodyExt;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::config::Config;
    use crate::db::{
        models::{ROLE_ADMIN, ROLE_USER},
        CreateUser, User, UserRepository,
    };
    use crate::services::auth::AuthService;
    use crate::services::email::testing::RecordingMailer;
    use crate::services::scheduler::SlotGenerator;
    use crate::AppState;

    pub async fn test_state() -> Arc<AppState> {
        let (state, _) = test_state_with_mailer().await;
        state
    }

    pub async fn test_state_with_mailer() -> (Arc<AppState>, Arc<RecordingMailer>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let mut config = Config::default();
        config.jwt.secret = "test-secret".to_string();
        config.email.admin_address = Some("shop@example.com".to_string());

        let scheduler = SlotGenerator::from_config(&config.schedule).unwrap();
        let mailer = Arc::new(RecordingMailer::new());

        let state = Arc::new(AppState {
            db: pool,
            config,
            mailer: mailer.clone(),
            scheduler,
        });
        (state, mailer)
    }

    /// Insert a user with the given role and return it with a valid token.
    pub async fn seed_user(state: &Arc<AppState>, email: &str, role: &str) -> (User, String) {
        let user = UserRepository::create(
            &state.db,
            CreateUser {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password_hash: AuthService::hash_password("hunter2hunter2").unwrap(),
                role: role.to_string(),
                picture: String::new(),
            },
        )
        .await
        .unwrap();
        let token = AuthService::create_jwt(state, &user.id).unwrap();
        (user, token)
    }

    pub async fn seed_admin(state: &Arc<AppState>) -> (User, String) {
        seed_user(state, "admin@example.com", ROLE_ADMIN).await
    }

    pub async fn seed_client(state: &Arc<AppState>) -> (User, String) {
        seed_user(state, "client@example.com", ROLE_USER).await
    }

    pub fn request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
