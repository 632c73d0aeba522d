//! MediLocate Core Library
//!
//! Finds pharmacies stocking a medicine and ranks them by distance from the user.
//!
//! # Architecture
//!
//! ```text
//!   Address ──► Geocoder ──► user coordinate
//!                                  │
//!             ┌────────────────────┴────────────────────┐
//!             ▼                                         ▼
//!     Result Aggregator                          Graph Builder
//!  filter → group → merge batches       complete graph + origin node
//!             │                                         │
//!             ▼                                         ▼
//!   ranked pharmacy list                     Shortest-Path Engine
//!                                         (binary heap | reference)
//!                                                       │
//!                                                       ▼
//!                                         path to nearest pharmacy
//!
//!   Medicine catalog ──► Prefix Index (trie, swapped on rebuild) ──► autocomplete
//! ```
//!
//! # Modules
//!
//! - [`geo`]: haversine distance
//! - [`index`]: medicine-name trie and the shared catalog index
//! - [`graph`]: location graph, Dijkstra and its reference implementation
//! - [`locator`]: result aggregation and query orchestration
//! - [`directory`]: in-memory pharmacies and inventory
//! - [`models`]: domain types
//! - [`config`]: locator settings

pub mod config;
pub mod directory;
pub mod geo;
pub mod graph;
pub mod index;
pub mod locator;
pub mod models;

// Re-export commonly used types
pub use config::{LocatorConfig, PathRanking};
pub use directory::{InventoryUpdate, PharmacyDirectory};
pub use graph::{PathAlgorithm, WeightedGraph};
pub use index::{CatalogIndex, MedicineTrie};
pub use locator::{Geocoder, Locator, StaticGeocoder};
pub use models::{
    AggregatedMedicine, Coordinate, InventoryRow, LocatedEntity, NearestPath, PharmacyRecord,
    RankedPharmacyResult,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MediLocateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not resolve location: {0}")]
    UnresolvableLocation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<locator::LocatorError> for MediLocateError {
    fn from(e: locator::LocatorError) -> Self {
        use locator::LocatorError;
        match e {
            LocatorError::InvalidInput(msg) => MediLocateError::InvalidInput(msg),
            LocatorError::UnresolvableLocation(address) => {
                MediLocateError::UnresolvableLocation(address)
            }
            LocatorError::NoPathFound(medicine) => {
                MediLocateError::NotFound(format!("No reachable pharmacy stocks: {}", medicine))
            }
            LocatorError::Graph(inner) => MediLocateError::InternalError(inner.to_string()),
        }
    }
}

impl From<directory::DirectoryError> for MediLocateError {
    fn from(e: directory::DirectoryError) -> Self {
        use directory::DirectoryError;
        let message = e.to_string();
        match e {
            DirectoryError::UnknownPharmacy(_) => MediLocateError::NotFound(message),
            DirectoryError::InvalidPharmacy(_) | DirectoryError::InvalidRows(_) => {
                MediLocateError::InvalidInput(message)
            }
        }
    }
}

impl From<config::ConfigError> for MediLocateError {
    fn from(e: config::ConfigError) -> Self {
        MediLocateError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediLocateError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MediLocateError::InternalError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create a core with default settings.
#[uniffi::export]
pub fn new_core_default() -> Arc<MediLocateCore> {
    Arc::new(MediLocateCore::with_config(LocatorConfig::default()))
}

/// Create a core from a JSON settings document.
#[uniffi::export]
pub fn new_core(config_json: String) -> Result<Arc<MediLocateCore>, MediLocateError> {
    let config = LocatorConfig::from_json(&config_json)?;
    Ok(Arc::new(MediLocateCore::with_config(config)))
}

/// Install a stderr log subscriber. `RUST_LOG` wins over `filter` when set.
///
/// Returns `false` if a subscriber was already installed.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<bool, MediLocateError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&filter))
        .map_err(|e| MediLocateError::ConfigError(e.to_string()))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe locator wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MediLocateCore {
    locator: Locator,
    directory: Arc<Mutex<PharmacyDirectory>>,
}

impl MediLocateCore {
    fn with_config(config: LocatorConfig) -> Self {
        Self {
            locator: Locator::new(config),
            directory: Arc::new(Mutex::new(PharmacyDirectory::new())),
        }
    }
}

#[uniffi::export]
impl MediLocateCore {
    // =========================================================================
    // Directory Operations
    // =========================================================================

    /// Add or update a pharmacy.
    pub fn upsert_pharmacy(&self, pharmacy: FfiPharmacy) -> Result<(), MediLocateError> {
        let mut directory = self.directory.lock()?;
        directory.upsert_pharmacy(pharmacy.into())?;
        Ok(())
    }

    /// Replace a pharmacy's inventory. Rebuilds autocomplete if the catalog changed.
    pub fn replace_inventory(
        &self,
        pharmacy_id: String,
        rows: Vec<FfiInventoryRow>,
    ) -> Result<u32, MediLocateError> {
        let rows = parse_rows(&pharmacy_id, rows)?;
        let mut directory = self.directory.lock()?;
        let update = directory.replace_inventory(&pharmacy_id, rows)?;
        if update.catalog_changed {
            self.locator.rebuild_catalog(directory.medicine_catalog());
        }
        Ok(update.rows as u32)
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Autocomplete medicine names.
    pub fn search_by_prefix(&self, prefix: String) -> Vec<String> {
        self.locator.suggest(&prefix)
    }

    /// Pharmacies stocking the medicine, nearest first.
    pub fn search_medicine(
        &self,
        latitude: f64,
        longitude: f64,
        medicine_name: String,
    ) -> Result<Vec<FfiRankedPharmacy>, MediLocateError> {
        let directory = self.directory.lock()?;
        let results = self.locator.search_medicine(
            &directory,
            Coordinate::new(latitude, longitude),
            &medicine_name,
        )?;
        Ok(results.into_iter().map(|r| r.into()).collect())
    }

    /// Path to the nearest pharmacy stocking the medicine.
    pub fn find_nearest_path(
        &self,
        latitude: f64,
        longitude: f64,
        medicine_name: String,
    ) -> Result<FfiNearestPath, MediLocateError> {
        let directory = self.directory.lock()?;
        let nearest = self.locator.find_nearest_path(
            &directory,
            Coordinate::new(latitude, longitude),
            &medicine_name,
        )?;
        Ok(nearest.into())
    }

    /// Distinct medicine names in the autocomplete index.
    pub fn catalog_size(&self) -> u32 {
        self.locator.index().len() as u32
    }
}

fn parse_rows(
    pharmacy_id: &str,
    rows: Vec<FfiInventoryRow>,
) -> Result<Vec<InventoryRow>, MediLocateError> {
    let mut parsed = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        match NaiveDate::parse_from_str(row.expiry_date.trim(), "%Y-%m-%d") {
            Ok(expiry_date) => parsed.push(InventoryRow::new(
                pharmacy_id,
                row.medicine_name,
                row.stock,
                row.price,
                expiry_date,
            )),
            // Header is line 1
            Err(e) => errors.push(format!("Line {}: invalid expiry date: {}", i + 2, e)),
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(MediLocateError::InvalidInput(errors.join("; ")))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe pharmacy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPharmacy {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<FfiPharmacy> for PharmacyRecord {
    fn from(p: FfiPharmacy) -> Self {
        PharmacyRecord {
            id: p.id,
            name: p.name,
            address: p.address,
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

impl From<PharmacyRecord> for FfiPharmacy {
    fn from(p: PharmacyRecord) -> Self {
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

/// FFI-safe inventory row. `expiry_date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInventoryRow {
    pub medicine_name: String,
    pub stock: u32,
    pub price: f64,
    pub expiry_date: String,
}

/// FFI-safe aggregated medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAggregatedMedicine {
    pub medicine_name: String,
    pub total_stock: u64,
    pub best_price: f64,
    pub earliest_expiry: String,
}

impl From<AggregatedMedicine> for FfiAggregatedMedicine {
    fn from(m: AggregatedMedicine) -> Self {
        Self {
            medicine_name: m.medicine_name,
            total_stock: m.total_stock,
            best_price: m.best_price,
            earliest_expiry: m.earliest_expiry.format("%Y-%m-%d").to_string(),
        }
    }
}

/// FFI-safe ranked pharmacy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRankedPharmacy {
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    pub pharmacy_address: String,
    pub distance_km: f64,
    pub medicines: Vec<FfiAggregatedMedicine>,
}

impl From<RankedPharmacyResult> for FfiRankedPharmacy {
    fn from(r: RankedPharmacyResult) -> Self {
        Self {
            pharmacy_id: r.pharmacy_id,
            pharmacy_name: r.pharmacy_name,
            pharmacy_address: r.pharmacy_address,
            distance_km: r.distance_km,
            medicines: r.medicines.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe nearest path.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNearestPath {
    pub path: Vec<String>,
    pub distance_km: f64,
    pub pharmacy: FfiPharmacy,
}

impl From<NearestPath> for FfiNearestPath {
    fn from(n: NearestPath) -> Self {
        Self {
            path: n.path,
            distance_km: n.distance_km,
            pharmacy: n.pharmacy.into(),
        }
    }
}
