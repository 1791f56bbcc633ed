use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{entity::profiles::ProfileType, validation::FieldErrors};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub file: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    pub description: Option<String>,
    pub working_hours: Option<String>,
    #[serde(rename = "type")]
    pub profile_type: Option<ProfileType>,

    #[schema(value_type = Option<Object>)]
    pub user: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub username: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub email: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub created_at: Option<Value>,
}

impl UpdateProfileRequest {
    pub fn read_only_violations(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        let read_only = [
            ("user", &self.user),
            ("username", &self.username),
            ("email", &self.email),
            ("created_at", &self.created_at),
        ];
        for (field, value) in read_only {
            if value.is_some() {
                errors.add(field, "This field is read-only.");
            }
        }
        errors
    }
}
