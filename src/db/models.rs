use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// RFC3339 with a fixed `Z` suffix so stored timestamps sort as text.
pub fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_ts() -> String {
    ts(Utc::now())
}

fn decode_err<E>(e: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(e))
}

pub(crate) fn get_uuid(row: &SqliteRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(col)?;
    Uuid::parse_str(&raw).map_err(decode_err)
}

pub(crate) fn get_opt_uuid(row: &SqliteRow, col: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let raw: Option<String> = row.try_get(col)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(decode_err))
        .transpose()
}

pub(crate) fn get_ts(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(col)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(decode_err)
}

pub(crate) fn get_opt_date(row: &SqliteRow, col: &str) -> Result<Option<NaiveDate>, sqlx::Error> {
    let raw: Option<String> = row.try_get(col)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(decode_err))
        .transpose()
}

/// Full user row including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for DbUser {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            name: row.try_get("name")?,
            is_active: row.try_get::<i64, _>("is_active")? != 0,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

/// A user as exposed over the API, with assigned role names.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRoles {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserWithRoles {
    pub fn from_user(user: DbUser, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            roles,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: Uuid,
    pub chemical_name: String,
    pub cid_number: Option<String>,
    pub cas_number: Option<String>,
    pub molecular_formula: Option<String>,
    pub hazard_class: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Chemical {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            chemical_name: row.try_get("chemical_name")?,
            cid_number: row.try_get("cid_number")?,
            cas_number: row.try_get("cas_number")?,
            molecular_formula: row.try_get("molecular_formula")?,
            hazard_class: row.try_get("hazard_class")?,
            description: row.try_get("description")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Supplier {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            name: row.try_get("name")?,
            contact_email: row.try_get("contact_email")?,
            contact_phone: row.try_get("contact_phone")?,
            address: row.try_get("address")?,
            website: row.try_get("website")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

/// Inventory item joined with its chemical and supplier.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub id: Uuid,
    pub chemical_id: Uuid,
    pub chemical_name: String,
    pub cid_number: Option<String>,
    pub hazard_class: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub location: Option<String>,
    pub lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub date_added: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for InventoryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            chemical_id: get_uuid(row, "chemical_id")?,
            chemical_name: row.try_get("chemical_name")?,
            cid_number: row.try_get("cid_number")?,
            hazard_class: row.try_get("hazard_class")?,
            supplier_id: get_opt_uuid(row, "supplier_id")?,
            supplier_name: row.try_get("supplier_name")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            location: row.try_get("location")?,
            lot_number: row.try_get("lot_number")?,
            expiration_date: get_opt_date(row, "expiration_date")?,
            date_added: get_ts(row, "date_added")?,
            notes: row.try_get("notes")?,
            created_by: get_uuid(row, "created_by")?,
            updated_by: get_opt_uuid(row, "updated_by")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexicographically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 11, 2, 3, 4, 5).unwrap();
        assert_eq!(ts(a), "2024-01-02T03:04:05.000000Z");
        assert!(ts(a) < ts(b));
    }
}
