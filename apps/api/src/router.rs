use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::{BookingState, router::booking_routes};
use practitioner_cell::{PractitionerState, router::practitioner_routes};
use shared_cache::InMemoryCache;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>, schedule_cache: Arc<InMemoryCache>) -> Router {
    let practitioner_state = PractitionerState {
        config: config.clone(),
        schedule_cache: schedule_cache.clone(),
    };

    let booking_state = BookingState {
        config,
        schedule_cache,
    };

    Router::new()
        .route("/", get(|| async { "Salon booking API is running!" }))
        .nest("/practitioners", practitioner_routes(practitioner_state))
        .nest("/booking", booking_routes(booking_state))
}
