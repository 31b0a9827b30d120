use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_BOOKED: &str = "booked";
/// Transitional status used by one legacy admin path; never branched on
/// anywhere else.
pub const STATUS_PENDING: &str = "pending";

/// One bookable unit of time. `date_time` is stored in UTC; business hours
/// are defined in the shop's local zone.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub date_time: NaiveDateTime,
    pub status: String,

    // Populated only when booked; empty strings while the slot is available.
    pub first_name: String,
    pub last_name: String,
    pub client_email: String,
    pub user_id: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }
}
