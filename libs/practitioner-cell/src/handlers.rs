use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_cache::schedule_cache_key;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::PractitionerState;
use crate::models::{
    AvatarUpload, CreatePractitionerRequest, CreateWorkingScheduleRequest,
    UpdatePractitionerRequest, UpdateWorkingScheduleRequest,
};
use crate::services::{PractitionerService, ScheduleService};

#[derive(Debug, Deserialize)]
pub struct PractitionerListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_practitioners_public(
    State(state): State<PractitionerState>,
    Query(query): Query<PractitionerListQuery>,
) -> Result<Json<Value>, AppError> {
    let practitioner_service = PractitionerService::new(&state.config);

    let practitioners = practitioner_service.list_practitioners(query.limit, query.offset).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "practitioners": practitioners,
        "total": practitioners.len()
    })))
}

#[axum::debug_handler]
pub async fn get_practitioner_public(
    State(state): State<PractitionerState>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let practitioner_service = PractitionerService::new(&state.config);

    let practitioner = practitioner_service.get_practitioner(&practitioner_id).await
        .map_err(|_| AppError::NotFound("Practitioner not found".to_string()))?;

    Ok(Json(json!(practitioner)))
}

#[axum::debug_handler]
pub async fn get_practitioner_schedules_public(
    State(state): State<PractitionerState>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state.config);

    let schedules = schedule_service.list_schedules(&practitioner_id, None).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "practitioner_id": practitioner_id,
        "schedules": schedules
    })))
}

// ==============================================================================
// PROTECTED PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_practitioner(
    State(state): State<PractitionerState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePractitionerRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.is_admin() {
        return Err(AppError::Auth("Only administrators can create practitioner profiles".to_string()));
    }

    let practitioner_service = PractitionerService::new(&state.config);

    let practitioner = practitioner_service.create_practitioner(request, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(practitioner)))
}

#[axum::debug_handler]
pub async fn update_practitioner(
    State(state): State<PractitionerState>,
    Path(practitioner_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePractitionerRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.can_manage_practitioner(&practitioner_id) {
        return Err(AppError::Auth("Not authorized to update this practitioner profile".to_string()));
    }

    let practitioner_service = PractitionerService::new(&state.config);

    let updated = practitioner_service.update_practitioner(&practitioner_id, request, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn upload_practitioner_avatar(
    State(state): State<PractitionerState>,
    Path(practitioner_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(upload): Json<AvatarUpload>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if user.id != practitioner_id {
        return Err(AppError::Auth("Not authorized to upload an avatar for this practitioner".to_string()));
    }

    let practitioner_service = PractitionerService::new(&state.config);

    let avatar_url = practitioner_service.upload_avatar(&practitioner_id, &upload.file_data, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "avatar_url": avatar_url })))
}

// ==============================================================================
// WORKING SCHEDULE HANDLERS (Practitioner Configuration)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<PractitionerState>,
    Path(practitioner_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateWorkingScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.can_manage_practitioner(&practitioner_id) {
        return Err(AppError::Auth("Not authorized to create schedules for this practitioner".to_string()));
    }

    let schedule_service = ScheduleService::new(&state.config);

    let schedule = schedule_service.create_schedule(&practitioner_id, request, token).await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.schedule_cache.invalidate(&schedule_cache_key(&practitioner_id)).await;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<PractitionerState>,
    Path((practitioner_id, schedule_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateWorkingScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.can_manage_practitioner(&practitioner_id) {
        return Err(AppError::Auth("Not authorized to update schedules for this practitioner".to_string()));
    }

    let schedule_service = ScheduleService::new(&state.config);

    let updated = schedule_service.update_schedule(&schedule_id, request, token).await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.schedule_cache.invalidate(&schedule_cache_key(&practitioner_id)).await;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<PractitionerState>,
    Path((practitioner_id, schedule_id)): Path<(String, String)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.can_manage_practitioner(&practitioner_id) {
        return Err(AppError::Auth("Not authorized to delete schedules for this practitioner".to_string()));
    }

    let schedule_service = ScheduleService::new(&state.config);

    schedule_service.delete_schedule(&schedule_id, token).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    state.schedule_cache.invalidate(&schedule_cache_key(&practitioner_id)).await;

    Ok(Json(json!({ "success": true })))
}
