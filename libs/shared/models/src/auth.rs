use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PRACTITIONER: &str = "practitioner";
pub const ROLE_CLIENT: &str = "client";

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ROLE_ADMIN)
    }

    pub fn is_practitioner(&self) -> bool {
        self.role.as_deref() == Some(ROLE_PRACTITIONER)
    }

    /// Admins may act on any practitioner's resources; practitioners only
    /// on their own.
    pub fn can_manage_practitioner(&self, practitioner_id: &str) -> bool {
        self.is_admin() || self.id == practitioner_id
    }
}
