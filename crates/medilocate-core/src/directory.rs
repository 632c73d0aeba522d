//! In-memory pharmacy directory and inventory store.
//!
//! Holds the pharmacy records and inventory rows the locator reads. An
//! inventory upload replaces a pharmacy's stock wholesale; it is never
//! merged into what was there before.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{InventoryRow, PharmacyRecord};

/// First data line of an upload; line 1 is the header.
const FIRST_DATA_LINE: usize = 2;

/// A rejected upload row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub reason: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Line {}: {}", self.line, self.reason)
    }
}

/// Directory errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("Unknown pharmacy: {0}")]
    UnknownPharmacy(String),

    #[error("Invalid pharmacy record: {0}")]
    InvalidPharmacy(String),

    #[error("Upload rejected with {} invalid row(s): {}", .0.len(), join_rows(.0))]
    InvalidRows(Vec<RowError>),
}

fn join_rows(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Outcome of an inventory replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryUpdate {
    /// Rows now stored for the pharmacy
    pub rows: usize,
    /// Whether the distinct medicine catalog changed, so the prefix index needs a rebuild
    pub catalog_changed: bool,
}

/// Pharmacies and their current inventory.
#[derive(Debug, Clone, Default)]
pub struct PharmacyDirectory {
    pharmacies: BTreeMap<String, PharmacyRecord>,
    inventory: BTreeMap<String, Vec<InventoryRow>>,
}

impl PharmacyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a pharmacy. Returns `true` if it was new.
    pub fn upsert_pharmacy(&mut self, record: PharmacyRecord) -> DirectoryResult<bool> {
        if record.id.trim().is_empty() {
            return Err(DirectoryError::InvalidPharmacy("id must not be empty".into()));
        }
        if record.name.trim().is_empty() {
            return Err(DirectoryError::InvalidPharmacy(format!(
                "{}: name must not be empty",
                record.id
            )));
        }
        let is_new = self.pharmacies.insert(record.id.clone(), record).is_none();
        Ok(is_new)
    }

    pub fn get_pharmacy(&self, id: &str) -> Option<&PharmacyRecord> {
        self.pharmacies.get(id)
    }

    /// All pharmacies, ordered by id.
    pub fn pharmacies(&self) -> impl Iterator<Item = &PharmacyRecord> {
        self.pharmacies.values()
    }

    pub fn pharmacy_count(&self) -> usize {
        self.pharmacies.len()
    }

    /// Replace a pharmacy's whole inventory.
    ///
    /// Rows are re-stamped with `pharmacy_id`. If any row is invalid, nothing
    /// is stored and every bad row is reported with its upload line number.
    pub fn replace_inventory(
        &mut self,
        pharmacy_id: &str,
        rows: Vec<InventoryRow>,
    ) -> DirectoryResult<InventoryUpdate> {
        if !self.pharmacies.contains_key(pharmacy_id) {
            return Err(DirectoryError::UnknownPharmacy(pharmacy_id.to_string()));
        }

        let errors: Vec<RowError> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                validate_row(row).map(|reason| RowError {
                    line: i + FIRST_DATA_LINE,
                    reason,
                })
            })
            .collect();
        if !errors.is_empty() {
            debug!(pharmacy_id, rejected = errors.len(), "inventory upload rejected");
            return Err(DirectoryError::InvalidRows(errors));
        }

        let catalog_before = self.catalog_keys();

        let rows: Vec<InventoryRow> = rows
            .into_iter()
            .map(|mut row| {
                row.pharmacy_id = pharmacy_id.to_string();
                row.medicine_name = row.medicine_name.trim().to_string();
                row
            })
            .collect();
        let count = rows.len();
        self.inventory.insert(pharmacy_id.to_string(), rows);

        let catalog_changed = self.catalog_keys() != catalog_before;
        info!(pharmacy_id, rows = count, catalog_changed, "inventory replaced");

        Ok(InventoryUpdate {
            rows: count,
            catalog_changed,
        })
    }

    /// Inventory for one pharmacy.
    pub fn inventory_for(&self, pharmacy_id: &str) -> &[InventoryRow] {
        self.inventory
            .get(pharmacy_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every stored inventory row, grouped by pharmacy id.
    pub fn inventory_rows(&self) -> impl Iterator<Item = &InventoryRow> {
        self.inventory.values().flatten()
    }

    /// Distinct medicine names, case-insensitively de-duplicated.
    ///
    /// The first spelling seen is kept.
    pub fn medicine_catalog(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.inventory_rows()
            .filter(|row| seen.insert(row.medicine_name.to_lowercase()))
            .map(|row| row.medicine_name.clone())
            .collect()
    }

    fn catalog_keys(&self) -> HashSet<String> {
        self.inventory_rows()
            .map(|row| row.medicine_name.to_lowercase())
            .collect()
    }
}

fn validate_row(row: &InventoryRow) -> Option<String> {
    if row.medicine_name.trim().is_empty() {
        return Some("medicine name is required".into());
    }
    if !row.price.is_finite() || row.price < 0.0 {
        return Some(format!("invalid price {}", row.price));
    }
    None
}
