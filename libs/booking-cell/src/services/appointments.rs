use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, BookedInterval, BookedTimesRow};
use crate::services::slots::normalize_clock_time;

/// Read side of the appointment table: the slot generator and the conflict
/// check both consume occupied intervals from here.
pub struct AppointmentStore {
    supabase: SupabaseClient,
}

impl AppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Occupied intervals for a practitioner on one calendar date, in
    /// ascending start order. Only appointments in an active status count;
    /// rows with unparsable times are skipped with a warning.
    pub async fn booked_intervals(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BookedInterval>> {
        let path = format!(
            "/rest/v1/appointments?practitioner_id=eq.{}&appointment_date=eq.{}&is_deleted=eq.false&status=in.(pending,confirmed,in_progress)&select=start_time,end_time&order=start_time.asc",
            practitioner_id, date
        );

        let result: Vec<BookedTimesRow> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        let mut intervals = Vec::with_capacity(result.len());
        for row in result {
            match (normalize_clock_time(&row.start_time), normalize_clock_time(&row.end_time)) {
                (Some(start), Some(end)) => intervals.push(BookedInterval { start, end }),
                _ => {
                    warn!(
                        "Skipping appointment with unparsable times: {} - {}",
                        row.start_time, row.end_time
                    );
                }
            }
        }

        Ok(intervals)
    }

    /// Full appointment rows for a practitioner's day view
    pub async fn appointments_for_date(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>> {
        debug!("Fetching appointments for practitioner {} on {}", practitioner_id, date);

        let path = format!(
            "/rest/v1/appointments?practitioner_id=eq.{}&appointment_date=eq.{}&is_deleted=eq.false&order=start_time.asc",
            practitioner_id, date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()?;

        Ok(appointments)
    }
}
