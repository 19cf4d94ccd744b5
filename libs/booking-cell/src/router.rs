use axum::{
    Router,
    middleware,
    routing::{get, patch, post},
};

use shared_utils::extractor::auth_middleware;

use crate::BookingState;
use crate::handlers;

pub fn booking_routes(state: BookingState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/services", get(handlers::list_services_public))
        .route("/practitioners/{practitioner_id}/slots", get(handlers::get_available_slots_public));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/appointments", post(handlers::create_appointment))
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/{appointment_id}/confirm", patch(handlers::confirm_appointment))
        .route("/appointments/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
