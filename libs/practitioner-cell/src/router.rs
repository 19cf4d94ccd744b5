use axum::{
    Router,
    middleware,
    routing::{delete, get, post, put},
};

use shared_utils::extractor::auth_middleware;

use crate::PractitionerState;
use crate::handlers;

pub fn practitioner_routes(state: PractitionerState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(handlers::list_practitioners_public))
        .route("/{practitioner_id}", get(handlers::get_practitioner_public))
        .route("/{practitioner_id}/schedules", get(handlers::get_practitioner_schedules_public));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        // Profile management
        .route("/", post(handlers::create_practitioner))
        .route("/{practitioner_id}", put(handlers::update_practitioner))
        .route("/{practitioner_id}/avatar", post(handlers::upload_practitioner_avatar))

        // Working schedule management
        .route("/{practitioner_id}/schedules", post(handlers::create_schedule))
        .route("/{practitioner_id}/schedules/{schedule_id}", put(handlers::update_schedule))
        .route("/{practitioner_id}/schedules/{schedule_id}", delete(handlers::delete_schedule))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
