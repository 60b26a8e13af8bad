use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::InventoryRow;
use crate::error::AppError;
use crate::types::patch::{double_option, non_blank};

/// Quantity as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
}

impl QuantityInput {
    pub fn parse(&self) -> Result<f64, AppError> {
        let value = match self {
            QuantityInput::Number(n) => *n,
            QuantityInput::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::Validation(format!("invalid quantity `{s}`")))?,
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(AppError::Validation(
                "quantity must be a positive number".to_string(),
            ));
        }
        Ok(value)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

/// RFC3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| AppError::Validation(format!("invalid dateAdded `{raw}`")))
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    non_blank(raw).map(|s| parse_date(&s)).transpose()
}

/// Body of `POST /inventory`. Every field is optional at the wire level so a
/// bulk request can report per-item validation failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    #[serde(alias = "chemical_name")]
    pub chemical_name: Option<String>,
    #[serde(alias = "cid_number")]
    pub cid_number: Option<String>,
    #[serde(alias = "hazard_class")]
    pub hazard_class: Option<String>,
    #[serde(alias = "supplier_name", alias = "supplier", alias = "name")]
    pub supplier_name: Option<String>,
    pub quantity: Option<QuantityInput>,
    pub unit: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "lot_number")]
    pub lot_number: Option<String>,
    #[serde(alias = "expiration_date")]
    pub expiration_date: Option<String>,
    #[serde(alias = "date_added")]
    pub date_added: Option<String>,
    pub notes: Option<String>,
}

/// A `NewInventoryItem` that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidInventoryItem {
    pub chemical_name: String,
    pub cid_number: Option<String>,
    pub hazard_class: Option<String>,
    pub supplier_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub location: Option<String>,
    pub lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub date_added: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewInventoryItem {
    /// Decode one item from raw JSON; type mismatches are validation errors.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("invalid inventory item: {e}")))
    }

    pub fn validate(self) -> Result<ValidInventoryItem, AppError> {
        let chemical_name = non_blank(self.chemical_name);
        let unit = non_blank(self.unit);
        let (Some(chemical_name), Some(quantity), Some(unit)) =
            (chemical_name, self.quantity.as_ref(), unit)
        else {
            return Err(AppError::Validation(
                "Chemical name, quantity, and unit required".to_string(),
            ));
        };
        Ok(ValidInventoryItem {
            chemical_name,
            cid_number: non_blank(self.cid_number),
            hazard_class: non_blank(self.hazard_class),
            supplier_name: non_blank(self.supplier_name),
            quantity: quantity.parse()?,
            unit,
            location: non_blank(self.location),
            lot_number: non_blank(self.lot_number),
            expiration_date: parse_opt_date(self.expiration_date)?,
            date_added: non_blank(self.date_added)
                .map(|s| parse_timestamp(&s))
                .transpose()?,
            notes: non_blank(self.notes),
        })
    }
}

/// `POST /inventory` accepts one item or an array of items. Array elements
/// stay raw JSON so each one is decoded, and reported, on its own.
#[derive(Debug, Clone)]
pub enum CreateInventoryBody {
    Many(Vec<Value>),
    One(NewInventoryItem),
}

impl TryFrom<Value> for CreateInventoryBody {
    type Error = AppError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        match body {
            Value::Array(items) => Ok(Self::Many(items)),
            other => NewInventoryItem::from_json(other).map(Self::One),
        }
    }
}

/// Per-item failure reported by a bulk insert.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BulkItemError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkInsertResponse {
    pub success: bool,
    pub data: Vec<InventoryRow>,
    pub errors: Vec<BulkItemError>,
}

/// Body of `PUT /inventory/{id}`: only present fields change, `null` clears
/// nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(alias = "chemical_name")]
    pub chemical_name: Option<String>,
    #[serde(default, alias = "cid_number", deserialize_with = "double_option")]
    pub cid_number: Option<Option<String>>,
    #[serde(default, alias = "hazard_class", deserialize_with = "double_option")]
    pub hazard_class: Option<Option<String>>,
    #[serde(
        default,
        alias = "supplier_name",
        alias = "supplier",
        alias = "name",
        deserialize_with = "double_option"
    )]
    pub supplier_name: Option<Option<String>>,
    pub quantity: Option<QuantityInput>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, alias = "lot_number", deserialize_with = "double_option")]
    pub lot_number: Option<Option<String>>,
    #[serde(default, alias = "expiration_date", deserialize_with = "double_option")]
    pub expiration_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// A validated patch. `Some(None)` means "set to NULL".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidInventoryPatch {
    pub chemical_name: Option<String>,
    pub cid_number: Option<Option<String>>,
    pub hazard_class: Option<Option<String>>,
    pub supplier_name: Option<Option<String>>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub location: Option<Option<String>>,
    pub lot_number: Option<Option<String>>,
    pub expiration_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

impl ValidInventoryPatch {
    pub fn is_empty(&self) -> bool {
        *self == ValidInventoryPatch::default()
    }

    pub fn touches_chemical(&self) -> bool {
        self.cid_number.is_some() || self.hazard_class.is_some()
    }
}

impl InventoryPatch {
    pub fn validate(self) -> Result<ValidInventoryPatch, AppError> {
        let required = |field: &str, v: Option<String>| -> Result<Option<String>, AppError> {
            match v {
                None => Ok(None),
                Some(s) => non_blank(Some(s))
                    .map(Some)
                    .ok_or_else(|| AppError::Validation(format!("{field} cannot be empty"))),
            }
        };
        let patch = ValidInventoryPatch {
            chemical_name: required("chemicalName", self.chemical_name)?,
            cid_number: self.cid_number.map(non_blank),
            hazard_class: self.hazard_class.map(non_blank),
            supplier_name: self.supplier_name.map(non_blank),
            quantity: self.quantity.as_ref().map(QuantityInput::parse).transpose()?,
            unit: required("unit", self.unit)?,
            location: self.location.map(non_blank),
            lot_number: self.lot_number.map(non_blank),
            expiration_date: self.expiration_date.map(parse_opt_date).transpose()?,
            notes: self.notes.map(non_blank),
        };
        if patch.is_empty() {
            return Err(AppError::Validation("Update data required".to_string()));
        }
        Ok(patch)
    }
}

/// Column an inventory listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ChemicalName,
    Quantity,
    Location,
    HazardClass,
    SupplierName,
    ExpirationDate,
    DateAdded,
}

impl SortField {
    fn parse(raw: &str) -> Result<Self, AppError> {
        Ok(match raw {
            "chemicalName" | "chemical_name" => SortField::ChemicalName,
            "quantity" => SortField::Quantity,
            "location" => SortField::Location,
            "hazardClass" | "hazard_class" => SortField::HazardClass,
            "supplierName" | "supplier_name" | "supplier" => SortField::SupplierName,
            "expirationDate" | "expiration_date" => SortField::ExpirationDate,
            "dateAdded" | "date_added" => SortField::DateAdded,
            other => return Err(AppError::Validation(format!("cannot sort by `{other}`"))),
        })
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::ChemicalName => "c.chemical_name",
            SortField::Quantity => "i.quantity",
            SortField::Location => "i.location",
            SortField::HazardClass => "c.hazard_class",
            SortField::SupplierName => "s.name",
            SortField::ExpirationDate => "i.expiration_date",
            SortField::DateAdded => "i.date_added",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw query string of `GET /inventory`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub search: Option<String>,
    #[serde(alias = "hazard_class")]
    pub hazard_class: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "sort", alias = "sort_by")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub hazard_class: Option<String>,
    pub location: Option<String>,
    pub sort: Option<SortField>,
    pub order: SortOrder,
}

impl TryFrom<InventoryQuery> for InventoryFilter {
    type Error = AppError;

    fn try_from(q: InventoryQuery) -> Result<Self, Self::Error> {
        let sort = non_blank(q.sort_by)
            .map(|s| SortField::parse(&s))
            .transpose()?;
        let order = match non_blank(q.order).map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "order must be `asc` or `desc`, got `{other}`"
                )));
            }
        };
        Ok(Self {
            search: non_blank(q.search),
            hazard_class: non_blank(q.hazard_class),
            location: non_blank(q.location),
            sort,
            order,
        })
    }
}

/// Escape `%`, `_` and `\` and wrap the term for a substring `LIKE ... ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_camel_and_snake_case_fields() {
        let camel: NewInventoryItem = serde_json::from_value(json!({
            "chemicalName": "Acetone", "quantity": 2.5, "unit": "L", "supplierName": "Acme"
        }))
        .unwrap();
        let snake: NewInventoryItem = serde_json::from_value(json!({
            "chemical_name": "Acetone", "quantity": "2.5", "unit": "L", "name": "Acme"
        }))
        .unwrap();
        assert_eq!(camel.validate().unwrap(), snake.validate().unwrap());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let item: NewInventoryItem =
            serde_json::from_value(json!({ "chemicalName": "  ", "quantity": 1, "unit": "g" }))
                .unwrap();
        assert!(matches!(item.validate(), Err(AppError::Validation(_))));

        let item: NewInventoryItem =
            serde_json::from_value(json!({ "chemicalName": "NaCl", "unit": "g" })).unwrap();
        assert!(matches!(item.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn quantity_must_be_positive_number() {
        assert_eq!(QuantityInput::Text(" 3 ".into()).parse().unwrap(), 3.0);
        assert!(QuantityInput::Number(0.0).parse().is_err());
        assert!(QuantityInput::Number(-1.0).parse().is_err());
        assert!(QuantityInput::Text("lots".into()).parse().is_err());
    }

    #[test]
    fn expiration_date_accepts_iso_timestamp() {
        let item: NewInventoryItem = serde_json::from_value(json!({
            "chemicalName": "NaCl", "quantity": 1, "unit": "g",
            "expirationDate": "2026-03-01T00:00:00.000Z"
        }))
        .unwrap();
        let valid = item.validate().unwrap();
        assert_eq!(valid.expiration_date, NaiveDate::from_ymd_opt(2026, 3, 1));

        let bad: NewInventoryItem = serde_json::from_value(json!({
            "chemicalName": "NaCl", "quantity": 1, "unit": "g", "expirationDate": "soon"
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn body_may_be_single_item_or_array() {
        let one = CreateInventoryBody::try_from(json!({ "chemicalName": "NaCl" })).unwrap();
        assert!(matches!(one, CreateInventoryBody::One(_)));
        let many =
            CreateInventoryBody::try_from(json!([{ "chemicalName": "NaCl" }, { "quantity": true }]))
                .unwrap();
        assert!(matches!(many, CreateInventoryBody::Many(v) if v.len() == 2));
    }

    #[test]
    fn wrong_typed_single_item_is_a_validation_error() {
        let err = CreateInventoryBody::try_from(json!({
            "chemicalName": "NaCl", "quantity": 1, "unit": "g", "notes": 5
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.starts_with("invalid inventory item")));
        assert!(CreateInventoryBody::try_from(json!("NaCl")).is_err());
    }

    #[test]
    fn dates_must_be_exact() {
        assert_eq!(parse_date("2026-03-01").unwrap(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(
            parse_date("2026-03-01T23:30:00-05:00").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("2026-03-01garbage").is_err());
        assert!(parse_date("2026-03-01T").is_err());

        assert_eq!(
            parse_timestamp("2026-03-01").unwrap(),
            DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z").unwrap()
        );
        assert!(parse_timestamp("2026-03-01T10:00:00Z").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: InventoryPatch =
            serde_json::from_value(json!({ "notes": null, "quantity": 4 })).unwrap();
        let patch = patch.validate().unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.location, None);
        assert_eq!(patch.quantity, Some(4.0));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let patch: InventoryPatch = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(patch.validate(), Err(AppError::Validation(m)) if m == "Update data required"));
        let patch: InventoryPatch = serde_json::from_value(json!({ "unit": "" })).unwrap();
        assert!(patch.validate().is_err());
    }

    #[test]
    fn filter_parses_sort_and_order() {
        let filter = InventoryFilter::try_from(InventoryQuery {
            sort_by: Some("quantity".into()),
            order: Some("DESC".into()),
            search: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.sort, Some(SortField::Quantity));
        assert_eq!(filter.order, SortOrder::Desc);
        assert_eq!(filter.search, None);

        assert!(
            InventoryFilter::try_from(InventoryQuery {
                sort_by: Some("password_hash".into()),
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ace"), "%ace%");
        assert_eq!(like_pattern("50%_x\\"), "%50\\%\\_x\\\\%");
    }
}
