//! Inventory rows and the aggregated results derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::location::PharmacyRecord;

/// One stocked batch of a medicine at a pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRow {
    /// Owning pharmacy
    pub pharmacy_id: String,
    /// Medicine name as uploaded (original casing)
    pub medicine_name: String,
    /// Units on hand
    pub stock: u32,
    /// Unit price
    pub price: f64,
    /// Batch expiry
    pub expiry_date: NaiveDate,
}

impl InventoryRow {
    pub fn new(
        pharmacy_id: impl Into<String>,
        medicine_name: impl Into<String>,
        stock: u32,
        price: f64,
        expiry_date: NaiveDate,
    ) -> Self {
        Self {
            pharmacy_id: pharmacy_id.into(),
            medicine_name: medicine_name.into(),
            stock,
            price,
            expiry_date,
        }
    }

    /// Case-insensitive substring match against the medicine name.
    pub fn matches(&self, name_filter: &str) -> bool {
        self.medicine_name
            .to_lowercase()
            .contains(&name_filter.to_lowercase())
    }

    /// Price/expiry pair for batch merging.
    pub fn batch(&self) -> InventoryBatch {
        InventoryBatch {
            price: self.price,
            expiry_date: self.expiry_date,
        }
    }
}

/// Price and expiry of a single batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InventoryBatch {
    pub price: f64,
    pub expiry_date: NaiveDate,
}

/// All batches of one medicine at one pharmacy, merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedMedicine {
    pub medicine_name: String,
    /// Sum of stock across batches
    pub total_stock: u64,
    /// Lowest batch price
    pub best_price: f64,
    /// Soonest batch expiry
    pub earliest_expiry: NaiveDate,
}

/// A pharmacy stocking the queried medicine, with its distance from the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedPharmacyResult {
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    pub pharmacy_address: String,
    /// Rounded for display
    pub distance_km: f64,
    pub medicines: Vec<AggregatedMedicine>,
}

/// Answer to a path-to-nearest query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearestPath {
    /// Node ids from the origin to the winning pharmacy
    pub path: Vec<String>,
    /// Cumulative edge weight along `path`
    pub distance_km: f64,
    /// The winning pharmacy
    pub pharmacy: PharmacyRecord,
}

impl NearestPath {
    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Serialize a ranked result list to pretty JSON.
pub fn results_to_json(results: &[RankedPharmacyResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}
