use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Singleton configuration row (id = 1) holding the bookable hour windows.
/// Hours are local to the shop timezone; the end hour is exclusive, so a
/// `weekday_end` of 20 makes 19:30 the last weekday slot.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeSettings {
    pub weekday_start: i64,
    pub weekday_end: i64,
    pub weekend_start: i64,
    pub weekend_end: i64,
}

impl Default for TimeRangeSettings {
    fn default() -> Self {
        TimeRangeSettings {
            weekday_start: 10,
            weekday_end: 20,
            weekend_start: 8,
            weekend_end: 20,
        }
    }
}
