use axum::extract::{FromRequest, Request};
use axum::extract::rejection::JsonRejection;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// `axum::Json` for request bodies, rejecting with a 400 `AppError` body
/// instead of axum's plain-text 415/422.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "rejected request body");
        AppError::Validation(rejection.body_text())
    }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
