use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::db::models::{Chemical, Supplier, get_uuid, now_ts};
use crate::db::sqlite::SqlitePool;
use crate::error::AppError;
use crate::types::catalog::{NewChemical, NewSupplier, SupplierPatch};

const CHEMICAL_COLUMNS: &str = "id, chemical_name, cid_number, cas_number, molecular_formula, \
     hazard_class, description, created_at, updated_at";
const SUPPLIER_COLUMNS: &str =
    "id, name, contact_email, contact_phone, address, website, created_at, updated_at";

/// Lookup-or-insert a chemical by (case-insensitive) name.
///
/// A single `INSERT ... ON CONFLICT ... RETURNING` statement, so two writers
/// racing on the same new name end up with one row. Blank identifier fields
/// on an existing row are filled in; populated ones are kept.
pub async fn get_or_create_chemical(
    conn: &mut SqliteConnection,
    name: &str,
    cid_number: Option<&str>,
    hazard_class: Option<&str>,
) -> Result<Uuid, AppError> {
    let now = now_ts();
    let row = sqlx::query(
        r#"INSERT INTO chemicals (id, chemical_name, cid_number, hazard_class, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT(chemical_name) DO UPDATE SET
               cid_number = COALESCE(chemicals.cid_number, excluded.cid_number),
               hazard_class = COALESCE(chemicals.hazard_class, excluded.hazard_class)
           RETURNING id"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(cid_number)
    .bind(hazard_class)
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(get_uuid(&row, "id")?)
}

/// Lookup-or-insert a supplier by (case-insensitive) name.
pub async fn get_or_create_supplier(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Uuid, AppError> {
    let now = now_ts();
    let row = sqlx::query(
        r#"INSERT INTO suppliers (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)
           ON CONFLICT(name) DO UPDATE SET name = suppliers.name
           RETURNING id"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(get_uuid(&row, "id")?)
}

/// Chemicals and suppliers.
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_chemicals(&self) -> Result<Vec<Chemical>, AppError> {
        let rows = sqlx::query_as::<_, Chemical>(&format!(
            "SELECT {CHEMICAL_COLUMNS} FROM chemicals ORDER BY chemical_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_chemical(&self, id: Uuid) -> Result<Chemical, AppError> {
        sqlx::query_as::<_, Chemical>(&format!(
            "SELECT {CHEMICAL_COLUMNS} FROM chemicals WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Chemical not found".to_string()))
    }

    pub async fn create_chemical(&self, name: &str, c: NewChemical) -> Result<Chemical, AppError> {
        let id = Uuid::new_v4();
        let now = now_ts();
        sqlx::query(
            r#"INSERT INTO chemicals (id, chemical_name, cid_number, cas_number, molecular_formula,
                   hazard_class, description, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(c.cid_number)
        .bind(c.cas_number)
        .bind(c.molecular_formula)
        .bind(c.hazard_class)
        .bind(c.description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::on_unique(e, "Chemical already exists"))?;
        self.get_chemical(id).await
    }

    /// Fails with 409 while inventory still references the chemical.
    pub async fn delete_chemical(&self, id: Uuid) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM chemicals WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::on_foreign_key(e, "Chemical is referenced by inventory"))?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Chemical not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<Supplier, AppError> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier not found".to_string()))
    }

    pub async fn create_supplier(&self, name: &str, s: NewSupplier) -> Result<Supplier, AppError> {
        let id = Uuid::new_v4();
        let now = now_ts();
        sqlx::query(
            r#"INSERT INTO suppliers (id, name, contact_email, contact_phone, address, website,
                   created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(s.contact_email)
        .bind(s.contact_phone)
        .bind(s.address)
        .bind(s.website)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::on_unique(e, "Supplier already exists"))?;
        self.get_supplier(id).await
    }

    pub async fn update_supplier(
        &self,
        id: Uuid,
        patch: SupplierPatch,
    ) -> Result<Supplier, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE suppliers SET updated_at = ");
        qb.push_bind(now_ts());
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        for (column, value) in [
            ("contact_email", patch.contact_email),
            ("contact_phone", patch.contact_phone),
            ("address", patch.address),
            ("website", patch.website),
        ] {
            if let Some(value) = value {
                qb.push(format!(", {column} = ")).push_bind(value);
            }
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::on_unique(e, "Supplier already exists"))?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier not found".to_string()));
        }
        self.get_supplier(id).await
    }

    /// Inventory rows pointing at the supplier keep existing with a NULL supplier.
    pub async fn delete_supplier(&self, id: Uuid) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier not found".to_string()));
        }
        Ok(())
    }
}
