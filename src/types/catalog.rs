use serde::Deserialize;

use crate::error::AppError;
use crate::types::patch::{double_option, non_blank};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChemical {
    pub chemical_name: Option<String>,
    pub cid_number: Option<String>,
    pub cas_number: Option<String>,
    pub molecular_formula: Option<String>,
    pub hazard_class: Option<String>,
    pub description: Option<String>,
}

impl NewChemical {
    /// Trim every field; the name is required.
    pub fn validate(self) -> Result<(String, Self), AppError> {
        let name = non_blank(self.chemical_name)
            .ok_or_else(|| AppError::Validation("Chemical name required".to_string()))?;
        let rest = Self {
            chemical_name: Some(name.clone()),
            cid_number: non_blank(self.cid_number),
            cas_number: non_blank(self.cas_number),
            molecular_formula: non_blank(self.molecular_formula),
            hazard_class: non_blank(self.hazard_class),
            description: non_blank(self.description),
        };
        Ok((name, rest))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

impl NewSupplier {
    pub fn validate(self) -> Result<(String, Self), AppError> {
        let name = non_blank(self.name)
            .ok_or_else(|| AppError::Validation("Supplier name required".to_string()))?;
        let rest = Self {
            name: Some(name.clone()),
            contact_email: non_blank(self.contact_email),
            contact_phone: non_blank(self.contact_phone),
            address: non_blank(self.address),
            website: non_blank(self.website),
        };
        Ok((name, rest))
    }
}

/// Body of `PUT /suppliers/{id}`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
}

impl SupplierPatch {
    pub fn validate(self) -> Result<Self, AppError> {
        let name = match self.name {
            None => None,
            Some(n) => Some(
                non_blank(Some(n))
                    .ok_or_else(|| AppError::Validation("Supplier name cannot be empty".into()))?,
            ),
        };
        let patch = Self {
            name,
            contact_email: self.contact_email.map(non_blank),
            contact_phone: self.contact_phone.map(non_blank),
            address: self.address.map(non_blank),
            website: self.website.map(non_blank),
        };
        if patch == Self::default() {
            return Err(AppError::Validation("Update data required".to_string()));
        }
        Ok(patch)
    }
}
