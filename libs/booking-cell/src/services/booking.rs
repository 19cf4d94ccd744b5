use chrono::{Duration, NaiveTime, Utc};
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, BookingError, CreateAppointmentRequest,
};
use crate::services::appointments::AppointmentStore;
use crate::services::catalog::CatalogService;

pub struct BookingService {
    supabase: SupabaseClient,
    appointments: AppointmentStore,
    catalog: CatalogService,
    phone_pattern: Option<Regex>,
    max_daily_appointments: i32,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            appointments: AppointmentStore::new(config),
            catalog: CatalogService::new(config),
            // Compiled once per service
            phone_pattern: Regex::new(r"^\+?[0-9 ().-]{7,20}$").ok(),
            max_daily_appointments: config.max_daily_appointments_per_client,
        }
    }

    /// Book a slot: resolves the service duration, re-checks conflicts
    /// against the day's active appointments, then inserts a pending row.
    pub async fn create_appointment(
        &self,
        client_id: &str,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!(
            "Booking appointment for client {} with practitioner {} on {}",
            client_id, request.practitioner_id, request.date
        );

        self.validate_contact(&request)?;

        let service = self.catalog.get_service(&request.service_id.to_string()).await?;

        let (end_time, wrapped) = request
            .start_time
            .overflowing_add_signed(Duration::minutes(i64::from(service.duration_minutes)));
        if wrapped != 0 {
            return Err(BookingError::InvalidTime(
                "Appointment may not run past midnight".to_string(),
            ));
        }

        self.check_daily_limit(client_id, request.date, auth_token).await?;

        let booked = self
            .appointments
            .booked_intervals(&request.practitioner_id.to_string(), request.date)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let conflict = booked
            .iter()
            .any(|b| intervals_overlap(request.start_time, end_time, b.start, b.end));

        if conflict {
            warn!(
                "Booking conflict for practitioner {} at {} on {}",
                request.practitioner_id, request.start_time, request.date
            );
            return Err(BookingError::SlotNotAvailable);
        }

        let appointment_data = json!({
            "practitioner_id": request.practitioner_id,
            "client_id": client_id,
            "service_id": request.service_id,
            "appointment_date": request.date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Pending,
            "client_name": request.client_name,
            "client_phone": request.client_phone,
            "notes": request.notes,
            "is_deleted": false,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let appointment: Appointment = match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))?,
            None => return Err(BookingError::DatabaseError("Failed to create appointment".to_string())),
        };

        debug!("Appointment created with ID: {}", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&is_deleted=eq.false", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e))),
            None => Err(BookingError::NotFound),
        }
    }

    /// `pending -> confirmed`; anything else is an invalid transition
    pub async fn confirm_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.status != AppointmentStatus::Pending {
            return Err(BookingError::InvalidStatusTransition(appointment.status));
        }

        self.set_status(appointment_id, AppointmentStatus::Confirmed, auth_token).await
    }

    /// Cancel a pending or confirmed appointment
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if !matches!(
            appointment.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        ) {
            return Err(BookingError::InvalidStatusTransition(appointment.status));
        }

        self.set_status(appointment_id, AppointmentStatus::Cancelled, auth_token).await
    }

    async fn set_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Setting appointment {} status to {}", appointment_id, status);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "status": status,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(headers),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e))),
            None => Err(BookingError::NotFound),
        }
    }

    fn validate_contact(&self, request: &CreateAppointmentRequest) -> Result<(), BookingError> {
        if request.client_name.trim().is_empty() {
            return Err(BookingError::ValidationError("Client name must not be empty".to_string()));
        }

        if let (Some(pattern), Some(phone)) = (&self.phone_pattern, &request.client_phone) {
            if !pattern.is_match(phone) {
                return Err(BookingError::ValidationError(format!(
                    "Invalid phone number: {}",
                    phone
                )));
            }
        }

        Ok(())
    }

    async fn check_daily_limit(
        &self,
        client_id: &str,
        date: chrono::NaiveDate,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&appointment_date=eq.{}&is_deleted=eq.false&status=in.(pending,confirmed,in_progress)&select=id",
            client_id, date
        );

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if existing.len() as i32 >= self.max_daily_appointments {
            return Err(BookingError::DailyLimitReached);
        }

        Ok(())
    }
}

fn intervals_overlap(start1: NaiveTime, end1: NaiveTime, start2: NaiveTime, end2: NaiveTime) -> bool {
    // Half-open on both sides: touching endpoints do not conflict
    start1 < end2 && start2 < end1
}
