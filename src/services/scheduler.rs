//! Appointment slot generation and conflict pruning.
//!
//! Business hours are defined in the shop's local timezone; appointment
//! instants are stored in UTC. The generator produces a rolling window of
//! half-hour slots (today through today + horizon, inclusive) and resets the
//! never-booked inventory on every run, so re-triggering after a failure is
//! always safe.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::config::ScheduleConfig;
use crate::db::{models::TimeRangeSettings, AppointmentRepository};
use crate::error::{AppError, AppResult};

pub const SLOT_MINUTES: [u32; 2] = [0, 30];

#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    tz: Tz,
    horizon_days: i64,
    conflict_buffer_minutes: i64,
}

impl SlotGenerator {
    pub fn new(tz: Tz, horizon_days: i64, conflict_buffer_minutes: i64) -> Self {
        SlotGenerator {
            tz,
            horizon_days,
            conflict_buffer_minutes,
        }
    }

    /// The zone business hours are defined in.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn from_config(schedule: &ScheduleConfig) -> anyhow::Result<Self> {
        let tz: Tz = schedule
            .shop_timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SHOP_TIMEZONE '{}': {}", schedule.shop_timezone, e))?;
        Ok(Self::new(
            tz,
            schedule.horizon_days,
            schedule.conflict_buffer_minutes,
        ))
    }

    /// Every instant a fresh slot should exist at, given the hour windows
    /// and the current instant. Settings are passed in rather than fetched
    /// so the computation stays a pure function of its arguments.
    pub fn candidate_slots(
        &self,
        settings: &TimeRangeSettings,
        now: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let today = now.with_timezone(&self.tz).date_naive();
        let mut slots = Vec::new();

        for offset in 0..=self.horizon_days {
            let day = today + Duration::days(offset);
            // Saturday and Sunday count as weekend (Monday = 1).
            let weekend = day.weekday().number_from_monday() >= 6;
            let (start, end) = if weekend {
                (settings.weekend_start, settings.weekend_end)
            } else {
                (settings.weekday_start, settings.weekday_end)
            };

            // End hour is exclusive: the last slot starts at end - 0:30.
            for hour in start..end {
                let Ok(hour) = u32::try_from(hour) else {
                    continue;
                };
                for minute in SLOT_MINUTES {
                    let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                        continue;
                    };
                    let local = match self.tz.from_local_datetime(&day.and_time(time)) {
                        LocalResult::Single(dt) => dt,
                        // Fall-back transition: take the earlier offset.
                        LocalResult::Ambiguous(earliest, _) => earliest,
                        // Spring-forward gap: the wall-clock time doesn't exist.
                        LocalResult::None => continue,
                    };

                    let instant = local.with_timezone(&Utc);
                    // No past slots, and nothing at the current instant either.
                    if instant <= now {
                        continue;
                    }
                    slots.push(instant);
                }
            }
        }

        slots
    }

    /// Reset the never-booked inventory and insert a fresh rolling window of
    /// available slots. Runs inside one transaction so a failure mid-run
    /// leaves the previous inventory intact rather than a partial set.
    ///
    /// Booked rows are never touched; the generator also does not check for
    /// booked rows at candidate instants, so a booked slot inside the window
    /// gains an available twin at the same instant. That mirrors the
    /// long-standing behavior of the schedule reset and is only mitigated by
    /// the duplicate check in the admin create route.
    pub async fn regenerate(
        &self,
        pool: &SqlitePool,
        settings: &TimeRangeSettings,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let slots = self.candidate_slots(settings, now);

        let mut tx = pool.begin().await.map_err(AppError::Database)?;
        let removed = AppointmentRepository::delete_available(&mut *tx).await?;
        for instant in &slots {
            AppointmentRepository::insert_available(&mut *tx, instant.naive_utc()).await?;
        }
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Regenerated appointment slots: removed {} available, created {}",
            removed,
            slots.len()
        );
        Ok(slots.len())
    }

    /// After a slot is booked, delete the available slot exactly one buffer
    /// (60 minutes) later, so the service time isn't offered back-to-back.
    ///
    /// Only that single instant is pruned; the slot half-way through the
    /// buffer (booked + 30 minutes) is intentionally left in place to match
    /// the behavior the rest of the system was built around.
    pub async fn prune_conflicts(&self, pool: &SqlitePool, booked_id: i64) -> AppResult<()> {
        let Some(booked) = AppointmentRepository::find_by_id(pool, booked_id).await? else {
            return Ok(());
        };

        let target = booked.date_time + Duration::minutes(self.conflict_buffer_minutes);
        let removed = AppointmentRepository::delete_available_at(pool, target).await?;
        if removed > 0 {
            tracing::info!(
                "Pruned {} conflicting slot(s) at {} after booking {}",
                removed,
                target,
                booked_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::db::models::*;
    use crate::db::repository::appointment::CreateAppointment;

    fn generator(horizon_days: i64) -> SlotGenerator {
        SlotGenerator::new(Los_Angeles, horizon_days, 60)
    }

    /// Local shop time -> UTC instant.
    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn weekday_window_with_default_settings() {
        // 2026-01-06 is a Tuesday; midnight "now" keeps every slot.
        let slots = generator(0).candidate_slots(&TimeRangeSettings::default(), local(2026, 1, 6, 0, 0));

        assert_eq!(slots.len(), 20);
        assert_eq!(slots.first().copied(), Some(local(2026, 1, 6, 10, 0)));
        assert_eq!(slots.last().copied(), Some(local(2026, 1, 6, 19, 30)));
        // End hour is exclusive: no 20:00 slot.
        assert!(!slots.contains(&local(2026, 1, 6, 20, 0)));
    }

    #[test]
    fn weekend_window_with_default_settings() {
        // 2026-01-10 is a Saturday.
        let slots = generator(0).candidate_slots(&TimeRangeSettings::default(), local(2026, 1, 10, 0, 0));

        assert_eq!(slots.len(), 24);
        assert_eq!(slots.first().copied(), Some(local(2026, 1, 10, 8, 0)));
        assert_eq!(slots.last().copied(), Some(local(2026, 1, 10, 19, 30)));
    }

    #[test]
    fn past_slots_are_excluded() {
        // 14:15 local on a Tuesday: nothing at or before 14:15 survives.
        let now = local(2026, 1, 6, 14, 15);
        let slots = generator(0).candidate_slots(&TimeRangeSettings::default(), now);

        assert!(!slots.contains(&local(2026, 1, 6, 14, 0)));
        assert_eq!(slots.first().copied(), Some(local(2026, 1, 6, 14, 30)));
        assert_eq!(slots.len(), 11);
    }

    #[test]
    fn slot_exactly_at_now_is_excluded() {
        let now = local(2026, 1, 6, 14, 30);
        let slots = generator(0).candidate_slots(&TimeRangeSettings::default(), now);

        assert!(!slots.contains(&now));
        assert_eq!(slots.first().copied(), Some(local(2026, 1, 6, 15, 0)));
    }

    #[test]
    fn window_spans_fifteen_days() {
        let slots = generator(14).candidate_slots(&TimeRangeSettings::default(), local(2026, 1, 5, 0, 0));

        let mut days: Vec<_> = slots
            .iter()
            .map(|s| s.with_timezone(&Los_Angeles).date_naive())
            .collect();
        days.dedup();
        assert_eq!(days.len(), 15);
    }

    #[test]
    fn custom_hours_are_respected() {
        let settings = TimeRangeSettings {
            weekday_start: 9,
            weekday_end: 12,
            ..TimeRangeSettings::default()
        };
        let slots = generator(0).candidate_slots(&settings, local(2026, 1, 6, 0, 0));

        assert_eq!(slots.len(), 6);
        assert_eq!(slots.first().copied(), Some(local(2026, 1, 6, 9, 0)));
        assert_eq!(slots.last().copied(), Some(local(2026, 1, 6, 11, 30)));
    }

    #[test]
    fn out_of_range_hours_produce_nothing() {
        // No validation happens on stored settings; nonsense hours just
        // generate an empty window instead of panicking.
        let settings = TimeRangeSettings {
            weekday_start: 25,
            weekday_end: 30,
            weekend_start: -3,
            weekend_end: -1,
            ..TimeRangeSettings::default()
        };
        let slots = generator(14).candidate_slots(&settings, local(2026, 1, 5, 0, 0));
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn regenerate_is_idempotent() {
        let pool = test_pool().await;
        let generator = generator(3);
        let now = local(2026, 1, 5, 0, 0);
        let settings = TimeRangeSettings::default();

        let first = generator.regenerate(&pool, &settings, now).await.unwrap();
        let after_first: Vec<_> = AppointmentRepository::list_by_status(&pool, STATUS_AVAILABLE)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.date_time)
            .collect();

        let second = generator.regenerate(&pool, &settings, now).await.unwrap();
        let after_second: Vec<_> = AppointmentRepository::list_by_status(&pool, STATUS_AVAILABLE)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.date_time)
            .collect();

        assert_eq!(first, second);
        assert_eq!(after_first, after_second);
        assert_eq!(after_first.len(), first);
    }

    #[tokio::test]
    async fn regenerate_preserves_booked_rows() {
        let pool = test_pool().await;
        let generator = generator(3);
        let now = local(2026, 1, 5, 9, 0);

        // A booking from last week; regeneration must leave it untouched.
        let booked = AppointmentRepository::create(
            &pool,
            CreateAppointment {
                date_time: local(2025, 12, 29, 10, 0).naive_utc(),
                first_name: "Jamie".to_string(),
                last_name: "Soto".to_string(),
                client_email: "jamie@example.com".to_string(),
                status: STATUS_BOOKED.to_string(),
                user_id: None,
            },
        )
        .await
        .unwrap();

        generator
            .regenerate(&pool, &TimeRangeSettings::default(), now)
            .await
            .unwrap();

        let found = AppointmentRepository::find_by_id(&pool, booked.id)
            .await
            .unwrap()
            .expect("booked row must survive regeneration");
        assert_eq!(found.status, STATUS_BOOKED);
        assert_eq!(found.first_name, "Jamie");
        assert_eq!(found.client_email, "jamie@example.com");
        assert_eq!(found.date_time, booked.date_time);
    }

    #[tokio::test]
    async fn prune_removes_only_the_buffer_slot() {
        let pool = test_pool().await;
        let generator = generator(0);

        let booked = AppointmentRepository::create(
            &pool,
            CreateAppointment {
                date_time: local(2026, 1, 6, 10, 0).naive_utc(),
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                client_email: "ana@example.com".to_string(),
                status: STATUS_BOOKED.to_string(),
                user_id: None,
            },
        )
        .await
        .unwrap();
        let half_hour = local(2026, 1, 6, 10, 30).naive_utc();
        let full_hour = local(2026, 1, 6, 11, 0).naive_utc();
        AppointmentRepository::insert_available(&pool, half_hour)
            .await
            .unwrap();
        AppointmentRepository::insert_available(&pool, full_hour)
            .await
            .unwrap();

        generator.prune_conflicts(&pool, booked.id).await.unwrap();

        // Known quirk, kept on purpose: only the slot exactly one buffer
        // after the booking goes away; the +30-minute slot stays bookable.
        assert!(AppointmentRepository::find_by_date_time(&pool, full_hour)
            .await
            .unwrap()
            .is_none());
        let survivor = AppointmentRepository::find_by_date_time(&pool, half_hour)
            .await
            .unwrap()
            .expect("+30 minute slot must not be pruned");
        assert_eq!(survivor.status, STATUS_AVAILABLE);
    }

    #[tokio::test]
    async fn prune_ignores_booked_rows_at_the_buffer_instant() {
        let pool = test_pool().await;
        let generator = generator(0);

        let booked = AppointmentRepository::create(
            &pool,
            CreateAppointment {
                date_time: local(2026, 1, 6, 10, 0).naive_utc(),
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                client_email: "ana@example.com".to_string(),
                status: STATUS_BOOKED.to_string(),
                user_id: None,
            },
        )
        .await
        .unwrap();
        let other = AppointmentRepository::create(
            &pool,
            CreateAppointment {
                date_time: local(2026, 1, 6, 11, 0).naive_utc(),
                first_name: "Luis".to_string(),
                last_name: "Mora".to_string(),
                client_email: "luis@example.com".to_string(),
                status: STATUS_BOOKED.to_string(),
                user_id: None,
            },
        )
        .await
        .unwrap();

        generator.prune_conflicts(&pool, booked.id).await.unwrap();

        assert!(AppointmentRepository::find_by_id(&pool, other.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn prune_with_unknown_id_is_a_no_op() {
        let pool = test_pool().await;
        generator(0).prune_conflicts(&pool, 9999).await.unwrap();
    }
}
