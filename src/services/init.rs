//! Initialization helpers for the application:
//! - database connection + migrations
//! - initial admin account seeding
//!
//! This module centralizes bits that would otherwise live in `main.rs`.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::db::{models::ROLE_ADMIN, CreateUser, UserRepository};
use crate::services::auth::AuthService;

/// Redact potentially sensitive information from a database URL before logging.
///
/// Attempts to parse the URL and remove userinfo (username:password) components.
/// Falls back to removing everything before '@' or returning "(redacted)".
pub fn redact_db_url(db_url: &str) -> String {
    if let Ok(url) = url::Url::parse(db_url) {
        let scheme = url.scheme();
        let host = url.host_str().unwrap_or("");
        let port_part = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = url.path();
        format!("{}://{}{}{}", scheme, host, port_part, path)
    } else {
        if let Some(at_pos) = db_url.find('@') {
            let without_creds = &db_url[at_pos + 1..];
            return format!("(redacted){}", without_creds);
        }
        "(redacted)".to_string()
    }
}

/// Initialize SQLite database connection and run migrations.
///
/// Creates the parent directory for the database file (if applicable),
/// opens a connection pool using `create_if_missing(true)` and runs migrations.
pub async fn init_db(config: &Config) -> Result<sqlx::SqlitePool> {
    let db_url = &config.database.url;
    tracing::info!("Connecting to database: {}", redact_db_url(db_url));

    // Extract the file path from the database URL
    let db_path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
    let db_file_path = Path::new(db_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    let connect_options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(connect_options)
        .await?;

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Seed an initial admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD` when
/// no admin exists yet. Without these variables the service starts with no
/// admin and the generator endpoint is unreachable, so we log a warning.
pub async fn seed_admin(pool: &sqlx::SqlitePool) -> Result<()> {
    if UserRepository::count_by_role(pool, ROLE_ADMIN).await? > 0 {
        return Ok(());
    }

    let (email, password) = match (
        std::env::var("ADMIN_EMAIL").ok(),
        std::env::var("ADMIN_PASSWORD").ok(),
    ) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            tracing::warn!(
                "No admin account exists and ADMIN_EMAIL/ADMIN_PASSWORD are not set; \
                 schedule generation will be unreachable until an admin is created"
            );
            return Ok(());
        }
    };

    let password_hash = AuthService::hash_password(&password)?;
    let admin = UserRepository::create(
        pool,
        CreateUser {
            email,
            first_name: "Admin".to_string(),
            last_name: String::new(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
            picture: String::new(),
        },
    )
    .await?;

    tracing::info!("Seeded initial admin account {}", admin.email);
    Ok(())
}
