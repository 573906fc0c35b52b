use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::admin::Admin;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Principal shape exposed to clients; never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AdminPublic {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub name: String,
}

impl From<&Admin> for AdminPublic {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            role: admin.role.clone(),
            name: admin.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub admin: AdminPublic,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub admin: AdminPublic,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTrainerRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTrainerRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<Uuid>,
}

impl From<&Admin> for TrainerSummary {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
            is_active: admin.is_active,
            created_at: admin.created_at,
            created_by: admin.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerListResponse {
    pub trainers: Vec<TrainerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerResponse {
    pub trainer: TrainerSummary,
}
