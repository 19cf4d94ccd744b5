use std::sync::Arc;

use shared_cache::KeyValueCache;
use shared_config::AppConfig;

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::*;

// Re-export the slot generation primitives; other cells and tests use
// these directly
pub use services::slots::{DEFAULT_SLOT_INTERVAL_MINUTES, generate_time_slots, normalize_clock_time};

/// Router state: app config plus the schedule cache shared with the
/// practitioner cell.
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub schedule_cache: Arc<dyn KeyValueCache>,
}
