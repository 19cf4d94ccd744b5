use std::sync::Arc;

use shared_cache::KeyValueCache;
use shared_config::AppConfig;

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::*;

/// Router state: app config plus the shared schedule cache, which schedule
/// writes invalidate so the booking cell never serves stale windows.
#[derive(Clone)]
pub struct PractitionerState {
    pub config: Arc<AppConfig>,
    pub schedule_cache: Arc<dyn KeyValueCache>,
}
