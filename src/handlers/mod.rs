pub mod auth;
pub mod catalog;
pub mod health;
pub mod inventory;
pub mod users;

use uuid::Uuid;

use crate::error::AppError;

/// Parse a path id; malformed ids are a client error.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid id `{raw}`")))
}
