use chrono::NaiveDate;

use crate::db::models::InventoryRow;
use crate::error::AppError;

pub const CSV_HEADERS: [&str; 12] = [
    "ID",
    "Chemical Name",
    "CID Number",
    "Quantity",
    "Unit",
    "Location",
    "Hazard Class",
    "Supplier",
    "Lot Number",
    "Expiration Date",
    "Date Added",
    "Notes",
];

/// Render inventory rows as CSV, quoting fields where needed.
pub fn inventory_to_csv(rows: &[InventoryRow]) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADERS)?;
    for row in rows {
        wtr.write_record([
            row.id.to_string(),
            row.chemical_name.clone(),
            row.cid_number.clone().unwrap_or_default(),
            row.quantity.to_string(),
            row.unit.clone(),
            row.location.clone().unwrap_or_default(),
            row.hazard_class.clone().unwrap_or_default(),
            row.supplier_name.clone().unwrap_or_default(),
            row.lot_number.clone().unwrap_or_default(),
            row.expiration_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            row.date_added.format("%Y-%m-%d").to_string(),
            row.notes.clone().unwrap_or_default(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| AppError::Internal(format!("csv flush failed: {}", e.error())))
}

/// `chemical_inventory_<date>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("chemical_inventory_{}.csv", date.format("%Y-%m-%d"))
}
