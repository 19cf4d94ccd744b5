use anyhow::{Result, anyhow};
use chrono::{NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateWorkingScheduleRequest, UpdateWorkingScheduleRequest, WorkingSchedule};

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create a recurring weekly working window for a practitioner
    pub async fn create_schedule(
        &self,
        practitioner_id: &str,
        request: CreateWorkingScheduleRequest,
        auth_token: &str,
    ) -> Result<WorkingSchedule> {
        debug!("Creating working schedule for practitioner: {}", practitioner_id);

        validate_window(request.day_of_week, request.start_time, request.end_time, request.time_slot_interval_minutes)?;

        self.check_schedule_conflicts(
            practitioner_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
            None,
            auth_token,
        ).await?;

        let schedule_data = json!({
            "practitioner_id": practitioner_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "time_slot_interval_minutes": request.time_slot_interval_minutes,
            "is_active": request.is_active.unwrap_or(true),
            "is_deleted": false,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/working_schedules",
            Some(auth_token),
            Some(schedule_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create working schedule"));
        }

        let schedule: WorkingSchedule = serde_json::from_value(result[0].clone())?;
        debug!("Working schedule created with ID: {}", schedule.id);

        Ok(schedule)
    }

    /// Update a working window; only provided fields change
    pub async fn update_schedule(
        &self,
        schedule_id: &str,
        request: UpdateWorkingScheduleRequest,
        auth_token: &str,
    ) -> Result<WorkingSchedule> {
        debug!("Updating working schedule: {}", schedule_id);

        let current = self.get_schedule_by_id(schedule_id, auth_token).await?;

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        let interval = request.time_slot_interval_minutes.or(current.time_slot_interval_minutes);

        validate_window(current.day_of_week, start_time, end_time, interval)?;

        self.check_schedule_conflicts(
            &current.practitioner_id.to_string(),
            current.day_of_week,
            start_time,
            end_time,
            Some(schedule_id),
            auth_token,
        ).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(start) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start.format("%H:%M:%S").to_string()));
        }
        if let Some(end) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end.format("%H:%M:%S").to_string()));
        }
        if let Some(interval) = request.time_slot_interval_minutes {
            update_data.insert("time_slot_interval_minutes".to_string(), json!(interval));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/working_schedules?id=eq.{}", schedule_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update working schedule"));
        }

        let updated: WorkingSchedule = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    /// All active, non-deleted windows for a practitioner, ordered by
    /// day-of-week then start time. Empty if none configured.
    pub async fn list_schedules(
        &self,
        practitioner_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<WorkingSchedule>> {
        debug!("Fetching working schedules for practitioner: {}", practitioner_id);

        let path = format!(
            "/rest/v1/working_schedules?practitioner_id=eq.{}&is_active=eq.true&is_deleted=eq.false&order=day_of_week.asc,start_time.asc",
            practitioner_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        let schedules: Vec<WorkingSchedule> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WorkingSchedule>, _>>()?;

        Ok(schedules)
    }

    /// Soft delete; the row stays for audit but stops feeding slot generation
    pub async fn delete_schedule(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deleting working schedule: {}", schedule_id);

        let path = format!("/rest/v1/working_schedules?id=eq.{}", schedule_id);
        let _: Vec<Value> = self.supabase.request(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "is_deleted": true,
                "updated_at": Utc::now().to_rfc3339()
            })),
        ).await?;

        Ok(())
    }

    pub async fn get_schedule_by_id(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<WorkingSchedule> {
        let path = format!("/rest/v1/working_schedules?id=eq.{}&is_deleted=eq.false", schedule_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Working schedule not found"));
        }

        let schedule: WorkingSchedule = serde_json::from_value(result[0].clone())?;
        Ok(schedule)
    }

    async fn check_schedule_conflicts(
        &self,
        practitioner_id: &str,
        day_of_week: i32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<&str>,
        auth_token: &str,
    ) -> Result<()> {
        let mut path = format!(
            "/rest/v1/working_schedules?practitioner_id=eq.{}&day_of_week=eq.{}&is_deleted=eq.false",
            practitioner_id,
            day_of_week
        );

        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        for schedule in existing {
            let existing_start = NaiveTime::parse_from_str(
                schedule["start_time"].as_str().unwrap_or("00:00:00"),
                "%H:%M:%S",
            )?;
            let existing_end = NaiveTime::parse_from_str(
                schedule["end_time"].as_str().unwrap_or("23:59:59"),
                "%H:%M:%S",
            )?;

            if start_time < existing_end && end_time > existing_start {
                return Err(anyhow!(
                    "Working schedule conflicts with existing window: {} - {}",
                    existing_start,
                    existing_end
                ));
            }
        }

        Ok(())
    }
}

fn validate_window(
    day_of_week: i32,
    start_time: NaiveTime,
    end_time: NaiveTime,
    interval_minutes: Option<i32>,
) -> Result<()> {
    if start_time >= end_time {
        return Err(anyhow!("Start time must be before end time"));
    }

    if !(0..=6).contains(&day_of_week) {
        return Err(anyhow!("Day of week must be between 0 (Sunday) and 6 (Saturday)"));
    }

    if let Some(interval) = interval_minutes {
        if interval <= 0 {
            return Err(anyhow!("Slot interval must be a positive number of minutes"));
        }
    }

    Ok(())
}
