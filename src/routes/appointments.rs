use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::db::{
    models::{Appointment, STATUS_AVAILABLE, STATUS_BOOKED, STATUS_PENDING},
    AppointmentRepository, CreateAppointment, UpdateAppointment,
};
use crate::error::AppError;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::services::email;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/user", get(my_appointments))
        .route("/:id", put(update).delete(delete))
        .route("/:id/cancel", put(cancel))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub client_email: String,
    pub status: Option<String>,
}

/// All fields optional; omitted ones keep their stored values. An empty
/// `firstName`/`clientEmail` also keeps the stored value, while an empty
/// `lastName` overwrites it. Callers rely on that asymmetry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub status: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub client_email: Option<String>,
}

fn validate_status(status: &str) -> Result<(), AppError> {
    match status {
        STATUS_AVAILABLE | STATUS_BOOKED | STATUS_PENDING => Ok(()),
        other => Err(AppError::BadRequest(format!(
            "Unknown appointment status: {}",
            other
        ))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List appointments. Admins see the whole schedule; everyone else only
/// sees slots that can still be booked.
async fn list(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = match user {
        Some(AuthUser(user)) if user.is_admin() => AppointmentRepository::list_all(&state.db).await?,
        _ => AppointmentRepository::list_by_status(&state.db, STATUS_AVAILABLE).await?,
    };
    Ok(Json(appointments))
}

/// The caller's own booked appointments, newest first.
async fn my_appointments(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = AppointmentRepository::list_booked_for_user(&state.db, &user.id).await?;
    Ok(Json(appointments))
}

/// Manually add a slot to the schedule (admin). Unlike the generator this
/// does check for an existing row at the same instant, since hand-added
/// slots are the main source of accidental duplicates.
async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateRequest>,
) -> Result<Json<Appointment>, AppError> {
    let status = request
        .status
        .unwrap_or_else(|| STATUS_AVAILABLE.to_string());
    validate_status(&status)?;

    if request.date_time <= Utc::now() {
        return Err(AppError::BadRequest(
            "Appointment time must be in the future".to_string(),
        ));
    }

    let date_time = request.date_time.naive_utc();
    if AppointmentRepository::find_by_date_time(&state.db, date_time)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "An appointment already exists at this time".to_string(),
        ));
    }

    let appointment = AppointmentRepository::create(
        &state.db,
        CreateAppointment {
            date_time,
            first_name: request.first_name,
            last_name: request.last_name,
            client_email: request.client_email,
            status,
            user_id: None,
        },
    )
    .await?;
    Ok(Json(appointment))
}

/// Update a slot; this is the booking endpoint. Setting `status` to
/// `booked` claims an available slot for the caller, sends the
/// confirmation emails and prunes the conflicting follow-up slot.
async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Appointment>, AppError> {
    let existing = AppointmentRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    if let Some(status) = &request.status {
        validate_status(status)?;
    }
    let status = request.status.unwrap_or_else(|| existing.status.clone());
    let booking = status == STATUS_BOOKED && existing.status != STATUS_BOOKED;

    if booking && !existing.is_available() {
        return Err(AppError::Conflict(
            "This slot is no longer available".to_string(),
        ));
    }
    // Non-admins can only touch slots they are booking or already own.
    if !user.is_admin() && !booking && existing.user_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::Forbidden);
    }

    let first_name = request
        .first_name
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| existing.first_name.clone());
    let last_name = request
        .last_name
        .unwrap_or_else(|| existing.last_name.clone());
    let client_email = request
        .client_email
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| existing.client_email.clone());
    let user_id = if booking {
        Some(user.id.clone())
    } else {
        existing.user_id.clone()
    };

    let updated = AppointmentRepository::update(
        &state.db,
        id,
        UpdateAppointment {
            date_time: existing.date_time,
            first_name,
            last_name,
            client_email,
            status,
            user_id,
        },
    )
    .await?;

    if booking {
        tracing::info!("Appointment {} booked by user {}", updated.id, user.id);
        send_booking_emails(&state, &updated).await;
        if let Err(e) = state.scheduler.prune_conflicts(&state.db, updated.id).await {
            tracing::warn!(
                "Failed to prune conflicting slots after booking {}: {:?}",
                updated.id,
                e
            );
        }
    }

    Ok(Json(updated))
}

/// Cancel a booking. The row is kept and reset to a blank available slot
/// so the time can be booked again. Only the booking owner or an admin may
/// cancel; no email is sent.
async fn cancel(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    let existing = AppointmentRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    if existing.status != STATUS_BOOKED {
        return Err(AppError::BadRequest(
            "Only booked appointments can be cancelled".to_string(),
        ));
    }
    if !user.is_admin() && existing.user_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::Forbidden);
    }

    let released = AppointmentRepository::release(&state.db, id).await?;
    tracing::info!("Appointment {} cancelled by user {}", id, user.id);
    Ok(Json(released))
}

/// Remove a slot from the schedule entirely (admin).
async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    AppointmentRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    AppointmentRepository::delete(&state.db, id).await?;
    Ok(Json(serde_json::json!({ "message": "Appointment deleted" })))
}

/// Notify the client and the shop about a new booking. Best-effort; a mail
/// failure never fails the booking.
async fn send_booking_emails(state: &Arc<AppState>, appointment: &Appointment) {
    let local = Utc
        .from_utc_datetime(&appointment.date_time)
        .with_timezone(&state.scheduler.timezone());
    let date = local.format("%m/%d/%Y").to_string();
    let time = local.format("%H:%M").to_string();
    let frontend = &state.config.server.frontend_url;

    if !appointment.client_email.is_empty() {
        let html = email::confirmation_email(frontend, &date, &time);
        email::send_or_log(
            state.mailer.as_ref(),
            &appointment.client_email,
            "Appointment Confirmation",
            &html,
        )
        .await;
    }

    if let Some(admin_address) = &state.config.email.admin_address {
        let html = email::admin_booking_notification(
            frontend,
            &appointment.first_name,
            &appointment.last_name,
            &appointment.client_email,
            &date,
            &time,
        );
        email::send_or_log(
            state.mailer.as_ref(),
            admin_address,
            "New Appointment Booked",
            &html,
        )
        .await;
    }
}
