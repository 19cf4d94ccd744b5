use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::BookingState;
use crate::models::{BookingError, CreateAppointmentRequest};
use crate::services::{AppointmentStore, BookingService, CatalogService, SlotService};

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub service_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    pub practitioner_id: Uuid,
    pub date: NaiveDate,
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => AppError::NotFound(e.to_string()),
        BookingError::ServiceNotFound => AppError::NotFound(e.to_string()),
        BookingError::SlotNotAvailable => AppError::Conflict(e.to_string()),
        BookingError::DailyLimitReached => AppError::Conflict(e.to_string()),
        BookingError::InvalidTime(_) => AppError::BadRequest(e.to_string()),
        BookingError::InvalidStatusTransition(_) => AppError::Conflict(e.to_string()),
        BookingError::ValidationError(_) => AppError::BadRequest(e.to_string()),
        BookingError::DatabaseError(_) => AppError::Internal(e.to_string()),
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_services_public(
    State(state): State<BookingState>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state.config);

    let services = catalog.list_services().await.map_err(map_booking_error)?;

    Ok(Json(json!({
        "services": services,
        "total": services.len()
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots_public(
    State(state): State<BookingState>,
    Path(practitioner_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    // Service duration comes from the catalog when a service is selected,
    // or is passed explicitly
    let duration_minutes = match (query.service_id, query.duration_minutes) {
        (Some(service_id), _) => {
            let catalog = CatalogService::new(&state.config);
            let service = catalog.get_service(&service_id.to_string()).await
                .map_err(map_booking_error)?;
            service.duration_minutes
        }
        (None, Some(duration)) => duration,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either service_id or duration_minutes is required".to_string(),
            ));
        }
    };

    if duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be positive".to_string(),
        ));
    }

    let slot_service = SlotService::new(&state.config, state.schedule_cache.clone());
    let slots = slot_service
        .slots_for_date(&practitioner_id, query.date, duration_minutes)
        .await;

    Ok(Json(json!({
        "practitioner_id": practitioner_id,
        "date": query.date,
        "slots": slots,
        "total_slots": slots.len()
    })))
}

// ==============================================================================
// PROTECTED APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<BookingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let booking_service = BookingService::new(&state.config);

    let appointment = booking_service.create_appointment(&user.id, request, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<BookingState>,
    Query(query): Query<AppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.can_manage_practitioner(&query.practitioner_id.to_string()) {
        return Err(AppError::Auth("Not authorized to view this practitioner's appointments".to_string()));
    }

    let store = AppointmentStore::new(&state.config);

    let appointments = store
        .appointments_for_date(&query.practitioner_id.to_string(), query.date, token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "practitioner_id": query.practitioner_id,
        "date": query.date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<BookingState>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let booking_service = BookingService::new(&state.config);

    let appointment = booking_service.get_appointment(&appointment_id, token).await
        .map_err(map_booking_error)?;

    if !user.can_manage_practitioner(&appointment.practitioner_id.to_string()) {
        return Err(AppError::Auth("Not authorized to confirm this appointment".to_string()));
    }

    let confirmed = booking_service.confirm_appointment(&appointment_id, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!(confirmed)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<BookingState>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let booking_service = BookingService::new(&state.config);

    let appointment = booking_service.get_appointment(&appointment_id, token).await
        .map_err(map_booking_error)?;

    let is_owner = appointment.client_id.to_string() == user.id;
    if !is_owner && !user.can_manage_practitioner(&appointment.practitioner_id.to_string()) {
        return Err(AppError::Auth("Not authorized to cancel this appointment".to_string()));
    }

    let cancelled = booking_service.cancel_appointment(&appointment_id, token).await
        .map_err(map_booking_error)?;

    Ok(Json(json!(cancelled)))
}
