use chrono::{NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Appointment Repository
// ============================================================================

pub struct AppointmentRepository;

#[derive(Debug, Clone)]
pub struct CreateAppointment {
    pub date_time: NaiveDateTime,
    pub first_name: String,
    pub last_name: String,
    pub client_email: String,
    pub status: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateAppointment {
    pub date_time: NaiveDateTime,
    pub first_name: String,
    pub last_name: String,
    pub client_email: String,
    pub status: String,
    pub user_id: Option<String>,
}

const APPOINTMENT_COLUMNS: &str = "id, date_time, status, first_name, last_name, client_email, \
                                   user_id, created_at, updated_at";

impl AppointmentRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Appointment>> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_date_time(
        pool: &SqlitePool,
        date_time: NaiveDateTime,
    ) -> AppResult<Option<Appointment>> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE date_time = ? LIMIT 1"
        ))
        .bind(date_time)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date_time ASC"
        ))
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_status(pool: &SqlitePool, status: &str) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE status = ? ORDER BY date_time ASC"
        ))
        .bind(status)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// The caller's booked appointments, newest first.
    pub async fn list_booked_for_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE user_id = ? AND status = ? ORDER BY date_time DESC"
        ))
        .bind(user_id)
        .bind(STATUS_BOOKED)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create(pool: &SqlitePool, new: CreateAppointment) -> AppResult<Appointment> {
        let now = Utc::now().naive_utc();
        sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (date_time, status, first_name, last_name, client_email, \
                                       user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(new.date_time)
        .bind(&new.status)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.client_email)
        .bind(&new.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Insert a blank available slot. Generic over the executor so the slot
    /// generator can run many inserts inside one transaction.
    pub async fn insert_available<'e, E>(executor: E, date_time: NaiveDateTime) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO appointments (date_time, status, first_name, last_name, client_email,
                                      user_id, created_at, updated_at)
            VALUES (?, ?, '', '', '', NULL, ?, ?)
            "#,
        )
        .bind(date_time)
        .bind(STATUS_AVAILABLE)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }

    /// Remove every never-booked slot. Booked (and pending) rows are never
    /// touched by this delete.
    pub async fn delete_available<'e, E>(executor: E) -> AppResult<u64>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM appointments WHERE status = ?")
            .bind(STATUS_AVAILABLE)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    /// Remove available slots at exactly the given instant.
    pub async fn delete_available_at(
        pool: &SqlitePool,
        date_time: NaiveDateTime,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM appointments WHERE date_time = ? AND status = ?")
            .bind(date_time)
            .bind(STATUS_AVAILABLE)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        update: UpdateAppointment,
    ) -> AppResult<Appointment> {
        let now = Utc::now().naive_utc();
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments \
             SET date_time = ?, status = ?, first_name = ?, last_name = ?, client_email = ?, \
                 user_id = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(update.date_time)
        .bind(&update.status)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.client_email)
        .bind(&update.user_id)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Reset a row to a blank available slot (cancellation).
    pub async fn release(pool: &SqlitePool, id: i64) -> AppResult<Appointment> {
        let now = Utc::now().naive_utc();
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments \
             SET status = ?, first_name = '', last_name = '', client_email = '', user_id = NULL, \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(STATUS_AVAILABLE)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
