use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreatePractitionerRequest, Practitioner, UpdatePractitionerRequest};

pub struct PractitionerService {
    supabase: SupabaseClient,
}

impl PractitionerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Active practitioners for the public booking page
    pub async fn list_practitioners(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<Practitioner>> {
        let mut path = "/rest/v1/practitioners?is_active=eq.true&order=last_name.asc,first_name.asc".to_string();

        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        if let Some(offset) = offset {
            path.push_str(&format!("&offset={}", offset));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        let practitioners: Vec<Practitioner> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Practitioner>, _>>()?;

        Ok(practitioners)
    }

    pub async fn get_practitioner(&self, practitioner_id: &str) -> Result<Practitioner> {
        let path = format!("/rest/v1/practitioners?id=eq.{}", practitioner_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Practitioner not found"));
        }

        let practitioner: Practitioner = serde_json::from_value(result[0].clone())?;
        Ok(practitioner)
    }

    pub async fn create_practitioner(
        &self,
        request: CreatePractitionerRequest,
        auth_token: &str,
    ) -> Result<Practitioner> {
        debug!("Creating practitioner profile for {}", request.email);

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(anyhow!("Practitioner name must not be empty"));
        }

        let practitioner_data = json!({
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "title": request.title,
            "bio": request.bio,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/practitioners",
            Some(auth_token),
            Some(practitioner_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create practitioner"));
        }

        let practitioner: Practitioner = serde_json::from_value(result[0].clone())?;
        debug!("Practitioner created with ID: {}", practitioner.id);

        Ok(practitioner)
    }

    pub async fn update_practitioner(
        &self,
        practitioner_id: &str,
        request: UpdatePractitionerRequest,
        auth_token: &str,
    ) -> Result<Practitioner> {
        debug!("Updating practitioner: {}", practitioner_id);

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(title) = request.title {
            update_data.insert("title".to_string(), json!(title));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/practitioners?id=eq.{}", practitioner_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update practitioner"));
        }

        let updated: Practitioner = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    /// Upload a base64 avatar to storage and write the public URL back to
    /// the practitioner profile
    pub async fn upload_avatar(
        &self,
        practitioner_id: &str,
        base64_image: &str,
        auth_token: &str,
    ) -> Result<String> {
        debug!("Uploading avatar for practitioner: {}", practitioner_id);

        // Accept both raw base64 and "data:image/...;base64,..." payloads
        let base64_data = base64_image
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(base64_image);

        let image_data = BASE64.decode(base64_data)?;

        let file_ext = if base64_image.contains("image/png") {
            "png"
        } else {
            "jpg"
        };

        let object_path = format!("avatars/{}/{}.{}", practitioner_id, Uuid::new_v4(), file_ext);
        let upload_path = format!("/storage/v1/object/profiles/{}", object_path);

        let _: Value = self.supabase.request(
            Method::POST,
            &upload_path,
            Some(auth_token),
            Some(json!({
                "data": image_data,
                "contentType": format!("image/{}", file_ext)
            })),
        ).await?;

        let public_url = self.supabase.get_public_url("profiles", &object_path);

        let update_path = format!("/rest/v1/practitioners?id=eq.{}", practitioner_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let update_result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &update_path,
            Some(auth_token),
            Some(json!({
                "avatar_url": public_url,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(headers),
        ).await?;

        if update_result.is_empty() {
            return Err(anyhow!("Failed to update avatar URL on practitioner profile"));
        }

        Ok(public_url)
    }
}
