use std::collections::HashMap;

use sqlx::{Row, SqliteExecutor};
use uuid::Uuid;

use crate::db::models::{DbUser, UserWithRoles, now_ts};
use crate::db::sqlite::SqlitePool;
use crate::error::AppError;
use crate::service::permissions::Role;

const USER_COLUMNS: &str = "id, email, password_hash, name, is_active, created_at, updated_at";

/// Users and their role assignments.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

async fn roles_of<'e, E>(exec: E, user_id: Uuid) -> Result<Vec<String>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        r#"SELECT r.name FROM user_role_assignments a
           INNER JOIN user_roles r ON a.role_id = r.id
           WHERE a.user_id = ? ORDER BY r.name"#,
    )
    .bind(user_id.to_string())
    .fetch_all(exec)
    .await?;
    rows.iter().map(|r| r.try_get("name")).collect()
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, AppError> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_with_roles(&self, id: Uuid) -> Result<Option<UserWithRoles>, AppError> {
        let Some(user) = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let roles = roles_of(&self.pool, id).await?;
        Ok(Some(UserWithRoles::from_user(user, roles)))
    }

    async fn require_with_roles(&self, id: Uuid) -> Result<UserWithRoles, AppError> {
        self.find_with_roles(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Insert a user and its initial role in one transaction.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
        assigned_by: Option<Uuid>,
    ) -> Result<UserWithRoles, AppError> {
        let id = Uuid::new_v4();
        let now = now_ts();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO users (id, email, password_hash, name, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, 1, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique(e, "User already exists"))?;

        sqlx::query(
            r#"INSERT INTO user_role_assignments (id, user_id, role_id, assigned_at, assigned_by)
               SELECT ?, ?, id, ?, ? FROM user_roles WHERE name = ?"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id.to_string())
        .bind(&now)
        .bind(assigned_by.map(|u| u.to_string()))
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.require_with_roles(id).await
    }

    pub async fn list_with_roles(&self) -> Result<Vec<UserWithRoles>, AppError> {
        let users = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email"
        ))
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"SELECT a.user_id, r.name FROM user_role_assignments a
               INNER JOIN user_roles r ON a.role_id = r.id
               ORDER BY r.name"#,
        )
        .fetch_all(&self.pool)
        .await?;
        let mut roles: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let user_id: String = row.try_get("user_id")?;
            let name: String = row.try_get("name")?;
            roles.entry(user_id).or_default().push(name);
        }

        Ok(users
            .into_iter()
            .map(|u| {
                let r = roles.remove(&u.id.to_string()).unwrap_or_default();
                UserWithRoles::from_user(u, r)
            })
            .collect())
    }

    pub async fn grant_role(
        &self,
        user_id: Uuid,
        role: Role,
        granted_by: Uuid,
    ) -> Result<UserWithRoles, AppError> {
        self.require_with_roles(user_id).await?;
        sqlx::query(
            r#"INSERT INTO user_role_assignments (id, user_id, role_id, assigned_at, assigned_by)
               SELECT ?, ?, id, ?, ? FROM user_roles WHERE name = ?"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(now_ts())
        .bind(granted_by.to_string())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::on_unique(e, format!("Role `{role}` already assigned")))?;
        self.require_with_roles(user_id).await
    }

    pub async fn revoke_role(&self, user_id: Uuid, role: Role) -> Result<UserWithRoles, AppError> {
        let res = sqlx::query(
            r#"DELETE FROM user_role_assignments
               WHERE user_id = ? AND role_id = (SELECT id FROM user_roles WHERE name = ?)"#,
        )
        .bind(user_id.to_string())
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Role assignment not found".to_string()));
        }
        self.require_with_roles(user_id).await
    }

    /// Soft (de)activation; users are never hard-deleted.
    pub async fn set_active(&self, user_id: Uuid, active: bool) -> Result<UserWithRoles, AppError> {
        let res = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(if active { 1 } else { 0 })
            .bind(now_ts())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.require_with_roles(user_id).await
    }
}
