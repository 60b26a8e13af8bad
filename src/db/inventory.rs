use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::catalog::{get_or_create_chemical, get_or_create_supplier};
use crate::db::models::{InventoryRow, get_uuid, now_ts, ts};
use crate::db::sqlite::SqlitePool;
use crate::error::AppError;
use crate::types::inventory::{
    BulkItemError, InventoryFilter, NewInventoryItem, ValidInventoryItem, ValidInventoryPatch,
    like_pattern,
};

const SELECT_JOINED: &str = r#"
SELECT i.id, i.chemical_id, c.chemical_name, c.cid_number, c.hazard_class,
       i.supplier_id, s.name AS supplier_name,
       i.quantity, i.unit, i.location, i.lot_number, i.expiration_date, i.date_added,
       i.notes, i.created_by, i.updated_by, i.created_at, i.updated_at
FROM inventory i
INNER JOIN chemicals c ON i.chemical_id = c.id
LEFT JOIN suppliers s ON i.supplier_id = s.id
"#;

/// Who is acting on an inventory row; owners and admins may modify it.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    fn may_modify(&self, owner: Uuid) -> bool {
        self.is_admin || self.id == owner
    }
}

async fn fetch_joined(conn: &mut SqliteConnection, id: Uuid) -> Result<InventoryRow, AppError> {
    sqlx::query_as::<_, InventoryRow>(&format!("{SELECT_JOINED} WHERE i.id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))
}

/// Owner and chemical of an item, or 404.
///
/// A no-op `UPDATE`, so it must be the first statement of the transaction:
/// the write lock is taken (waiting on `busy_timeout`) before any read, and
/// the WAL snapshot never needs upgrading.
async fn lock_owner(conn: &mut SqliteConnection, id: Uuid) -> Result<(Uuid, Uuid), AppError> {
    let row = sqlx::query(
        "UPDATE inventory SET updated_at = updated_at WHERE id = ? \
         RETURNING created_by, chemical_id",
    )
    .bind(id.to_string())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;
    Ok((get_uuid(&row, "created_by")?, get_uuid(&row, "chemical_id")?))
}

/// Inventory items joined with chemicals and suppliers.
#[derive(Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

impl InventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryRow>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_JOINED);
        qb.push(" WHERE 1 = 1");
        for (column, term) in [
            ("c.chemical_name", &filter.search),
            ("c.hazard_class", &filter.hazard_class),
            ("i.location", &filter.location),
        ] {
            if let Some(term) = term {
                qb.push(format!(" AND {column} LIKE "))
                    .push_bind(like_pattern(term))
                    .push(" ESCAPE '\\'");
            }
        }
        qb.push(" ORDER BY ");
        if let Some(sort) = filter.sort {
            qb.push(format!(
                "{} {}, ",
                sort.column(),
                filter.order.keyword()
            ));
        }
        qb.push("i.created_at ASC, i.id ASC");

        let rows = qb
            .build_query_as::<InventoryRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<InventoryRow, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_joined(&mut conn, id).await
    }

    /// Insert one item: chemical lookup-or-insert, supplier lookup-or-insert
    /// and the inventory row share a transaction that rolls back on error.
    pub async fn create(
        &self,
        item: ValidInventoryItem,
        created_by: Uuid,
    ) -> Result<InventoryRow, AppError> {
        let mut tx = self.pool.begin().await?;

        let chemical_id = get_or_create_chemical(
            &mut tx,
            &item.chemical_name,
            item.cid_number.as_deref(),
            item.hazard_class.as_deref(),
        )
        .await?;
        let supplier_id = match item.supplier_name.as_deref() {
            Some(name) => Some(get_or_create_supplier(&mut tx, name).await?),
            None => None,
        };

        let id = Uuid::new_v4();
        let now = now_ts();
        sqlx::query(
            r#"INSERT INTO inventory (id, chemical_id, supplier_id, quantity, unit, location,
                   lot_number, expiration_date, date_added, notes, created_by, updated_by,
                   created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(chemical_id.to_string())
        .bind(supplier_id.map(|s| s.to_string()))
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.location)
        .bind(&item.lot_number)
        .bind(item.expiration_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(ts(item.date_added.unwrap_or_else(Utc::now)))
        .bind(&item.notes)
        .bind(created_by.to_string())
        .bind(created_by.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let row = fetch_joined(&mut tx, id).await?;
        tx.commit().await?;
        debug!(id = %row.id, chemical = %row.chemical_name, "inventory item inserted");
        Ok(row)
    }

    /// Decode and insert each item in its own transaction, collecting failures
    /// per index alongside the rows that went in.
    pub async fn create_many(
        &self,
        items: Vec<Value>,
        created_by: Uuid,
    ) -> (Vec<InventoryRow>, Vec<BulkItemError>) {
        let mut created = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let parsed = NewInventoryItem::from_json(item).and_then(NewInventoryItem::validate);
            let result = match parsed {
                Ok(valid) => self.create(valid, created_by).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(row) => created.push(row),
                Err(e) => {
                    warn!(index, error = %e, "bulk inventory item rejected");
                    errors.push(BulkItemError {
                        index,
                        error: e.public_message(),
                    });
                }
            }
        }
        (created, errors)
    }

    /// Apply a partial update. Only the owner or an admin may do so.
    pub async fn update(
        &self,
        id: Uuid,
        patch: ValidInventoryPatch,
        actor: Actor,
    ) -> Result<InventoryRow, AppError> {
        let mut tx = self.pool.begin().await?;

        let (owner, mut chemical_id) = lock_owner(&mut tx, id).await?;
        if !actor.may_modify(owner) {
            return Err(AppError::Forbidden(
                "Cannot update other user's inventory".to_string(),
            ));
        }

        if let Some(name) = patch.chemical_name.as_deref() {
            let cid = patch.cid_number.clone().flatten();
            let hazard = patch.hazard_class.clone().flatten();
            chemical_id =
                get_or_create_chemical(&mut tx, name, cid.as_deref(), hazard.as_deref()).await?;
        }
        if patch.touches_chemical() {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE chemicals SET updated_at = ");
            qb.push_bind(now_ts());
            if let Some(cid) = &patch.cid_number {
                qb.push(", cid_number = ").push_bind(cid.clone());
            }
            if let Some(hazard) = &patch.hazard_class {
                qb.push(", hazard_class = ").push_bind(hazard.clone());
            }
            qb.push(" WHERE id = ").push_bind(chemical_id.to_string());
            qb.build().execute(&mut *tx).await?;
        }

        let supplier_id = match &patch.supplier_name {
            Some(Some(name)) => Some(Some(get_or_create_supplier(&mut tx, name).await?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE inventory SET updated_by = ");
        qb.push_bind(actor.id.to_string());
        qb.push(", updated_at = ").push_bind(now_ts());
        qb.push(", chemical_id = ").push_bind(chemical_id.to_string());
        if let Some(supplier_id) = supplier_id {
            qb.push(", supplier_id = ")
                .push_bind(supplier_id.map(|s| s.to_string()));
        }
        if let Some(quantity) = patch.quantity {
            qb.push(", quantity = ").push_bind(quantity);
        }
        if let Some(unit) = patch.unit {
            qb.push(", unit = ").push_bind(unit);
        }
        for (column, value) in [
            ("location", patch.location),
            ("lot_number", patch.lot_number),
            ("notes", patch.notes),
        ] {
            if let Some(value) = value {
                qb.push(format!(", {column} = ")).push_bind(value);
            }
        }
        if let Some(date) = patch.expiration_date {
            qb.push(", expiration_date = ")
                .push_bind(date.map(|d| d.format("%Y-%m-%d").to_string()));
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.build().execute(&mut *tx).await?;

        let row = fetch_joined(&mut tx, id).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Delete an item. Only the owner or an admin may do so.
    pub async fn delete(&self, id: Uuid, actor: Actor) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let (owner, _) = lock_owner(&mut tx, id).await?;
        if !actor.may_modify(owner) {
            return Err(AppError::Forbidden(
                "Cannot delete other user's inventory".to_string(),
            ));
        }
        sqlx::query("DELETE FROM inventory WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
