use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::profiles::ProfileType;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub repeated_password: String,
    #[serde(default, rename = "type")]
    pub profile_type: ProfileType,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub user_id: i32,
}
