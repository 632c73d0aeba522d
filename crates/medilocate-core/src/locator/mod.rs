//! Nearest-pharmacy resolution.
//!
//! Pipeline: Geocode → Aggregate & rank (list query)
//!           Geocode → Graph build → Shortest path per candidate (path query)

mod aggregator;

pub use aggregator::*;

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{LocatorConfig, PathRanking};
use crate::directory::PharmacyDirectory;
use crate::graph::{build_graph_from_records, GraphError, Path};
use crate::index::CatalogIndex;
use crate::models::{Coordinate, LocatedEntity, NearestPath, PharmacyRecord, RankedPharmacyResult};

/// Locator errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocatorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not resolve location: {0}")]
    UnresolvableLocation(String),

    #[error("No reachable pharmacy stocks: {0}")]
    NoPathFound(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type LocatorResult<T> = Result<T, LocatorError>;

/// Address → coordinate lookup performed before the core runs.
///
/// Implementations own their timeout and retry policy.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Option<Coordinate>;
}

/// Geocoder backed by a fixed address table (case- and whitespace-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Coordinate>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, address: &str, coordinate: Coordinate) -> Self {
        self.insert(address, coordinate);
        self
    }

    pub fn insert(&mut self, address: &str, coordinate: Coordinate) {
        self.entries.insert(normalize_address(address), coordinate);
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, address: &str) -> Option<Coordinate> {
        self.entries.get(&normalize_address(address)).copied()
    }
}

fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Answers nearest-pharmacy and autocomplete queries.
///
/// Owns the shared prefix index; every other structure is built per query.
#[derive(Debug)]
pub struct Locator {
    config: LocatorConfig,
    index: CatalogIndex,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}

impl Locator {
    /// Create a locator with an empty catalog.
    pub fn new(config: LocatorConfig) -> Self {
        let index = CatalogIndex::new(config.suggestion_limit);
        Self { config, index }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Swap in a prefix index built from `names`.
    pub fn rebuild_catalog<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.index.rebuild(names);
    }

    /// Autocomplete medicine names starting with `prefix`.
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        self.index.search_by_prefix(prefix)
    }

    /// Pharmacies stocking `medicine`, nearest first.
    ///
    /// No match is an empty list, not an error.
    pub fn search_medicine(
        &self,
        directory: &PharmacyDirectory,
        user_location: Coordinate,
        medicine: &str,
    ) -> LocatorResult<Vec<RankedPharmacyResult>> {
        let medicine = require_medicine(medicine)?;
        require_valid(user_location)?;

        let results = aggregate(
            directory.inventory_rows(),
            directory.pharmacies(),
            user_location,
            medicine,
            self.config.distance_decimals,
        );
        info!(medicine, results = results.len(), "medicine search");
        Ok(results)
    }

    /// [`search_medicine`](Self::search_medicine) for a street address.
    pub fn search_medicine_at(
        &self,
        directory: &PharmacyDirectory,
        geocoder: &dyn Geocoder,
        address: &str,
        medicine: &str,
    ) -> LocatorResult<Vec<RankedPharmacyResult>> {
        require_medicine(medicine)?;
        let user_location = resolve_address(geocoder, address)?;
        self.search_medicine(directory, user_location, medicine)
    }

    /// Path from the user to the best reachable pharmacy stocking `medicine`.
    ///
    /// Every located pharmacy in the directory becomes a graph node; only
    /// stocking pharmacies are candidate targets. A pharmacy whose id equals
    /// the origin id is left out of the graph.
    pub fn find_nearest_path(
        &self,
        directory: &PharmacyDirectory,
        user_location: Coordinate,
        medicine: &str,
    ) -> LocatorResult<NearestPath> {
        let medicine = require_medicine(medicine)?;
        require_valid(user_location)?;

        let origin_id = self.config.origin_id.as_str();
        if directory.get_pharmacy(origin_id).is_some() {
            warn!(
                pharmacy_id = origin_id,
                "pharmacy id clashes with the origin node, left out of path query"
            );
        }

        let candidates: Vec<&str> = candidate_ids(directory, medicine)
            .into_iter()
            .filter(|id| *id != origin_id)
            .collect();
        if candidates.is_empty() {
            return Err(LocatorError::NoPathFound(medicine.to_string()));
        }

        let origin = LocatedEntity::new(origin_id, user_location.latitude, user_location.longitude);
        let graph = build_graph_from_records(
            &origin,
            directory.pharmacies().filter(|p| p.id != origin_id),
        )?;

        let mut best: Option<(&str, Path)> = None;
        for &target in &candidates {
            let Some(path) = self
                .config
                .path_algorithm
                .shortest_path(&graph, &origin.id, target)
            else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((_, current)) => is_better(&path, current, self.config.path_ranking),
            };
            if better {
                best = Some((target, path));
            }
        }

        let Some((target, path)) = best else {
            return Err(LocatorError::NoPathFound(medicine.to_string()));
        };
        let pharmacy = directory
            .get_pharmacy(target)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(target.to_string()))?;

        debug!(
            candidates = candidates.len(),
            hops = path.hops(),
            distance_km = path.distance,
            "selected nearest path"
        );
        info!(medicine, pharmacy_id = %pharmacy.id, "nearest path found");

        Ok(NearestPath {
            path: path.nodes,
            distance_km: path.distance,
            pharmacy,
        })
    }

    /// [`find_nearest_path`](Self::find_nearest_path) for a street address.
    pub fn find_nearest_path_at(
        &self,
        directory: &PharmacyDirectory,
        geocoder: &dyn Geocoder,
        address: &str,
        medicine: &str,
    ) -> LocatorResult<NearestPath> {
        require_medicine(medicine)?;
        let user_location = resolve_address(geocoder, address)?;
        self.find_nearest_path(directory, user_location, medicine)
    }
}

/// Located pharmacies with a matching medicine, de-duplicated in first-seen order.
fn candidate_ids<'d>(directory: &'d PharmacyDirectory, medicine: &str) -> Vec<&'d str> {
    let mut seen = HashSet::new();
    directory
        .inventory_rows()
        .filter(|row| row.matches(medicine))
        .map(|row| row.pharmacy_id.as_str())
        .filter(|id| {
            directory
                .get_pharmacy(id)
                .and_then(PharmacyRecord::coordinate)
                .is_some()
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Strict comparison so the earlier candidate wins ties.
fn is_better(candidate: &Path, current: &Path, ranking: PathRanking) -> bool {
    match ranking {
        PathRanking::Distance => candidate.distance < current.distance,
        PathRanking::HopCount => candidate.nodes.len() < current.nodes.len(),
    }
}

fn require_medicine(medicine: &str) -> LocatorResult<&str> {
    let medicine = medicine.trim();
    if medicine.is_empty() {
        return Err(LocatorError::InvalidInput("medicine_name is required".into()));
    }
    Ok(medicine)
}

fn require_valid(location: Coordinate) -> LocatorResult<()> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(LocatorError::InvalidInput(format!(
            "invalid coordinate ({}, {})",
            location.latitude, location.longitude
        )))
    }
}

fn resolve_address(geocoder: &dyn Geocoder, address: &str) -> LocatorResult<Coordinate> {
    let address = address.trim();
    if address.is_empty() {
        return Err(LocatorError::InvalidInput("address is required".into()));
    }
    match geocoder.geocode(address) {
        Some(location) if location.is_valid() => Ok(location),
        _ => Err(LocatorError::UnresolvableLocation(address.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PathAlgorithm;
    use crate::models::InventoryRow;
    use chrono::NaiveDate;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn setup_directory() -> PharmacyDirectory {
        let mut directory = PharmacyDirectory::new();
        let pharmacies = [
            PharmacyRecord::new("near", "Near", "1 Main St").with_coordinates(0.0, 1.0),
            PharmacyRecord::new("far", "Far", "2 Main St").with_coordinates(0.0, 2.0),
            PharmacyRecord::new("nowhere", "Nowhere", "3 Main St"),
        ];
        for pharmacy in pharmacies {
            directory.upsert_pharmacy(pharmacy).unwrap();
        }

        let stock = [
            ("near", "Paracetamol", 10, 5.0),
            ("far", "Paracetamol", 20, 4.0),
            ("nowhere", "Insulin", 1, 4.0),
        ];
        for (id, name, units, price) in stock {
            directory
                .replace_inventory(id, vec![InventoryRow::new(id, name, units, price, expiry())])
                .unwrap();
        }
        directory
    }

    fn origin() -> Coordinate {
        Coordinate::new(0.0, 0.0)
    }

    #[test]
    fn test_nearest_path_is_direct_edge() {
        let directory = setup_directory();
        let locator = Locator::default();

        let nearest = locator
            .find_nearest_path(&directory, origin(), "paracetamol")
            .unwrap();
        assert_eq!(nearest.path, vec!["USER", "near"]);
        assert_eq!(nearest.pharmacy.name, "Near");
        assert!((nearest.distance_km - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_hop_count_ranking_prefers_first_candidate_on_ties() {
        let directory = setup_directory();
        let config = LocatorConfig {
            path_ranking: PathRanking::HopCount,
            ..LocatorConfig::default()
        };
        let locator = Locator::new(config);

        // Both candidates are one hop away; "far" comes first in directory order
        let nearest = locator
            .find_nearest_path(&directory, origin(), "paracetamol")
            .unwrap();
        assert_eq!(nearest.path, vec!["USER", "far"]);
    }

    #[test]
    fn test_reference_engine_gives_same_answer() {
        let directory = setup_directory();
        let locator = Locator::new(LocatorConfig {
            path_algorithm: PathAlgorithm::Reference,
            ..LocatorConfig::default()
        });
        let nearest = locator
            .find_nearest_path(&directory, origin(), "PARA")
            .unwrap();
        assert_eq!(nearest.path, vec!["USER", "near"]);
    }

    #[test]
    fn test_unlocated_candidates_are_not_reachable() {
        let directory = setup_directory();
        let locator = Locator::default();
        assert_eq!(
            locator.find_nearest_path(&directory, origin(), "insulin"),
            Err(LocatorError::NoPathFound("insulin".into()))
        );
    }

    #[test]
    fn test_blank_medicine_is_invalid() {
        let directory = setup_directory();
        let locator = Locator::default();
        assert!(matches!(
            locator.search_medicine(&directory, origin(), "   "),
            Err(LocatorError::InvalidInput(_))
        ));
        assert!(matches!(
            locator.find_nearest_path(&directory, origin(), ""),
            Err(LocatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_user_coordinate() {
        let directory = setup_directory();
        let locator = Locator::default();
        assert!(matches!(
            locator.search_medicine(&directory, Coordinate::new(91.0, 0.0), "aspirin"),
            Err(LocatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_origin_id_clash_leaves_pharmacy_out() {
        let directory = setup_directory();
        let locator = Locator::new(LocatorConfig {
            origin_id: "near".into(),
            ..LocatorConfig::default()
        });
        let nearest = locator
            .find_nearest_path(&directory, origin(), "paracetamol")
            .unwrap();
        assert_eq!(nearest.path, vec!["near", "far"]);
    }

    #[test]
    fn test_pharmacy_named_like_origin_does_not_block_queries() {
        let mut directory = setup_directory();
        directory
            .upsert_pharmacy(
                PharmacyRecord::new("USER", "User Pharmacy", "9 Main St")
                    .with_coordinates(10.0, 10.0),
            )
            .unwrap();
        directory
            .replace_inventory("USER", vec![InventoryRow::new("USER", "Aspirin", 3, 1.0, expiry())])
            .unwrap();
        let locator = Locator::default();

        let nearest = locator
            .find_nearest_path(&directory, origin(), "paracetamol")
            .unwrap();
        assert_eq!(nearest.path, vec!["USER", "near"]);
        assert_eq!(nearest.pharmacy.id, "near");

        // The clashing pharmacy still ranks in the list query
        let ranked = locator.search_medicine(&directory, origin(), "aspirin").unwrap();
        assert_eq!(ranked[0].pharmacy_id, "USER");
        assert_eq!(
            locator.find_nearest_path(&directory, origin(), "aspirin"),
            Err(LocatorError::NoPathFound("aspirin".into()))
        );
    }

    #[test]
    fn test_geocoder_lookup() {
        let directory = setup_directory();
        let locator = Locator::default();
        let geocoder = StaticGeocoder::new().with_entry("12 Harbour Road", origin());

        let results = locator
            .search_medicine_at(&directory, &geocoder, "  12   harbour ROAD ", "paracetamol")
            .unwrap();
        assert_eq!(results.len(), 2);

        assert_eq!(
            locator.search_medicine_at(&directory, &geocoder, "Atlantis", "paracetamol"),
            Err(LocatorError::UnresolvableLocation("Atlantis".into()))
        );
        assert!(matches!(
            locator.find_nearest_path_at(&directory, &geocoder, "", "paracetamol"),
            Err(LocatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_suggest_uses_rebuilt_catalog() {
        let directory = setup_directory();
        let locator = Locator::default();
        assert!(locator.suggest("p").is_empty());

        locator.rebuild_catalog(directory.medicine_catalog());
        assert_eq!(locator.suggest("P"), vec!["paracetamol"]);
        assert_eq!(locator.suggest(""), vec!["insulin", "paracetamol"]);
    }
}
