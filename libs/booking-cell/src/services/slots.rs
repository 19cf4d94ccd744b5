use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use practitioner_cell::models::WorkingSchedule;
use shared_cache::{KeyValueCache, schedule_cache_key};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookedInterval, TimeSlot};
use crate::services::appointments::AppointmentStore;

pub const DEFAULT_SLOT_INTERVAL_MINUTES: i64 = 30;

/// Sunday-indexed weekday, matching how schedule rows are keyed
pub fn day_of_week(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Normalize an appointment timestamp to wall-clock time of day.
///
/// The store holds `HH:MM:SS` times, but rows written by older clients carry
/// full date-times, with or without an offset. Offset-qualified values
/// contribute their own wall-clock component; no host-timezone conversion
/// is applied.
pub fn normalize_clock_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.time());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.time());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.time());
    }
    if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Some(t);
    }

    None
}

/// Generate the bookable slots for one date.
///
/// The first schedule window matching the date's weekday is used; no window
/// means no working hours that day and an empty result. Slots step from the
/// window start by the schedule's interval and stop once a slot start
/// reaches the window end, regardless of the requested duration. A slot is
/// unavailable when `[start, start + duration)` overlaps any booked
/// interval (half-open comparison on both sides).
///
/// Arithmetic runs in seconds since midnight so a slot end that runs past
/// the window, or past midnight, still compares correctly.
///
/// `service_duration_minutes` must be positive; callers validate.
pub fn generate_time_slots(
    schedules: &[WorkingSchedule],
    date: NaiveDate,
    booked: &[BookedInterval],
    service_duration_minutes: i32,
) -> Vec<TimeSlot> {
    let target_day = day_of_week(date);

    let schedule = match schedules
        .iter()
        .find(|s| s.day_of_week == target_day && s.is_active && !s.is_deleted)
    {
        Some(schedule) => schedule,
        None => return Vec::new(),
    };

    let interval_minutes = schedule
        .time_slot_interval_minutes
        .map(i64::from)
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_SLOT_INTERVAL_MINUTES);

    let window_start = i64::from(schedule.start_time.num_seconds_from_midnight());
    let window_end = i64::from(schedule.end_time.num_seconds_from_midnight());
    let duration_secs = i64::from(service_duration_minutes) * 60;
    let interval_secs = interval_minutes * 60;

    let booked_secs: Vec<(i64, i64)> = booked
        .iter()
        .map(|b| {
            (
                i64::from(b.start.num_seconds_from_midnight()),
                i64::from(b.end.num_seconds_from_midnight()),
            )
        })
        .collect();

    let mut slots = Vec::new();
    let mut current = window_start;

    while current < window_end {
        let slot_end = current + duration_secs;

        let available = !booked_secs
            .iter()
            .any(|(booked_start, booked_end)| current < *booked_end && slot_end > *booked_start);

        slots.push(TimeSlot {
            // Stays inside the window, so the addition cannot wrap
            time: schedule.start_time + Duration::seconds(current - window_start),
            available,
            is_working_hours: true,
        });

        current += interval_secs;
    }

    slots
}

/// Computes the slot sequence for a practitioner and date: fetches the
/// weekly schedule (through the injected cache) and the day's booked
/// intervals, then runs the pure generator over both.
pub struct SlotService {
    supabase: SupabaseClient,
    appointments: AppointmentStore,
    schedule_cache: Arc<dyn KeyValueCache>,
    cache_ttl: StdDuration,
}

impl SlotService {
    pub fn new(config: &AppConfig, schedule_cache: Arc<dyn KeyValueCache>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            appointments: AppointmentStore::new(config),
            schedule_cache,
            cache_ttl: StdDuration::from_secs(config.schedule_cache_ttl_secs),
        }
    }

    /// Slot sequence for one date. Store failures degrade to empty inputs
    /// with a logged warning; an empty schedule day is a normal empty
    /// result, not an error.
    pub async fn slots_for_date(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
        service_duration_minutes: i32,
    ) -> Vec<TimeSlot> {
        debug!(
            "Calculating slots for practitioner {} on {} ({} min service)",
            practitioner_id, date, service_duration_minutes
        );

        let schedules = match self.fetch_schedules(practitioner_id).await {
            Ok(schedules) => schedules,
            Err(e) => {
                warn!("Failed to fetch working schedules, treating as none: {}", e);
                Vec::new()
            }
        };

        let booked = match self.appointments.booked_intervals(practitioner_id, date).await {
            Ok(booked) => booked,
            Err(e) => {
                warn!("Failed to fetch appointments, treating day as free: {}", e);
                Vec::new()
            }
        };

        let slots = generate_time_slots(&schedules, date, &booked, service_duration_minutes);
        debug!("Generated {} slots ({} booked intervals)", slots.len(), booked.len());

        slots
    }

    async fn fetch_schedules(&self, practitioner_id: &str) -> Result<Vec<WorkingSchedule>> {
        let cache_key = schedule_cache_key(practitioner_id);

        if let Some(cached) = self.schedule_cache.get(&cache_key).await {
            if let Ok(schedules) = serde_json::from_str::<Vec<WorkingSchedule>>(&cached) {
                debug!("Schedule cache hit for practitioner {}", practitioner_id);
                return Ok(schedules);
            }
            // Unreadable entry; drop it and refetch
            self.schedule_cache.invalidate(&cache_key).await;
        }

        let path = format!(
            "/rest/v1/working_schedules?practitioner_id=eq.{}&is_active=eq.true&is_deleted=eq.false&order=day_of_week.asc,start_time.asc",
            practitioner_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        let schedules: Vec<WorkingSchedule> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WorkingSchedule>, _>>()?;

        if let Ok(serialized) = serde_json::to_string(&schedules) {
            self.schedule_cache.put(&cache_key, serialized, self.cache_ttl).await;
        }

        Ok(schedules)
    }
}
