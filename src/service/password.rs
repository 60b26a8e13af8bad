use crate::error::AppError;

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
        .map_err(AppError::from)
}

/// Compare a password with a stored hash. A malformed hash never matches.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
