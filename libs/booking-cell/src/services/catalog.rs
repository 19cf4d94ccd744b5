use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookingError, SalonService};

pub struct CatalogService {
    supabase: SupabaseClient,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Active services for the public booking page
    pub async fn list_services(&self) -> Result<Vec<SalonService>, BookingError> {
        let path = "/rest/v1/salon_services?is_active=eq.true&order=category.asc,name.asc";

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            None,
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let services: Vec<SalonService> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<SalonService>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse services: {}", e)))?;

        Ok(services)
    }

    /// Resolve one service; inactive services are not bookable
    pub async fn get_service(&self, service_id: &str) -> Result<SalonService, BookingError> {
        debug!("Fetching salon service: {}", service_id);

        let path = format!("/rest/v1/salon_services?id=eq.{}", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let service: SalonService = match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BookingError::DatabaseError(format!("Failed to parse service: {}", e)))?,
            None => return Err(BookingError::ServiceNotFound),
        };

        if !service.is_active {
            return Err(BookingError::ServiceNotFound);
        }

        Ok(service)
    }
}
