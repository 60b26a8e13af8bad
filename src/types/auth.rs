use serde::{Deserialize, Serialize};

use crate::db::models::UserWithRoles;
use crate::error::AppError;
use crate::types::patch::non_blank;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), AppError> {
        match (non_blank(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((email.to_lowercase(), password)),
            _ => Err(AppError::Validation(
                "Email and password required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

pub struct ValidRegistration {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidRegistration, AppError> {
        let (Some(email), Some(name), Some(password)) = (
            non_blank(self.email),
            non_blank(self.name),
            self.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Email, name, and password required".to_string(),
            ));
        };
        if !email.contains('@') {
            return Err(AppError::Validation(format!("invalid email `{email}`")));
        }
        Ok(ValidRegistration {
            email: email.to_lowercase(),
            name,
            password,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserWithRoles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleGrantRequest {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}
