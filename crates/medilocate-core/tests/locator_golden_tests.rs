//! Golden tests for the nearest-pharmacy locator.
//!
//! Each case loads a small directory, runs both queries and checks the
//! ranked list and the selected path against known answers.

use chrono::NaiveDate;
use medilocate_core::config::{LocatorConfig, PathRanking};
use medilocate_core::directory::PharmacyDirectory;
use medilocate_core::graph::PathAlgorithm;
use medilocate_core::locator::{Locator, LocatorError};
use medilocate_core::models::{Coordinate, InventoryRow, PharmacyRecord};

/// Pharmacy fixture: id, latitude, longitude.
type Site = (&'static str, f64, f64);

/// Stock fixture: pharmacy id, medicine, units, price, expiry.
type Stock = (&'static str, &'static str, u32, f64, &'static str);

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    user: (f64, f64),
    sites: Vec<Site>,
    stock: Vec<Stock>,
    query: &'static str,
    expected_ranking: Vec<(&'static str, f64)>,
    expected_path: Option<Vec<&'static str>>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "equator-two-pharmacies",
            user: (0.0, 0.0),
            sites: vec![("p1", 0.0, 1.0), ("p2", 0.0, 2.0)],
            stock: vec![
                ("p1", "Paracetamol", 10, 5.0, "2025-06-01"),
                ("p2", "Paracetamol", 20, 4.0, "2025-07-01"),
            ],
            query: "paracetamol",
            expected_ranking: vec![("p1", 111.19), ("p2", 222.39)],
            expected_path: Some(vec!["USER", "p1"]),
        },
        GoldenCase {
            id: "input-order-is-not-ranking",
            user: (0.0, 0.0),
            sites: vec![("a", 0.0, 3.0), ("b", 0.0, 1.0), ("c", 0.0, 2.0)],
            stock: vec![
                ("a", "Amoxicillin", 1, 1.0, "2025-06-01"),
                ("b", "Amoxicillin", 1, 1.0, "2025-06-01"),
                ("c", "Amoxicillin", 1, 1.0, "2025-06-01"),
            ],
            query: "amox",
            expected_ranking: vec![("b", 111.19), ("c", 222.39), ("a", 333.58)],
            expected_path: Some(vec!["USER", "b"]),
        },
        GoldenCase {
            id: "non-stocking-pharmacy-is-excluded",
            user: (0.0, 0.0),
            sites: vec![("close", 0.0, 0.5), ("stocked", 0.0, 1.0)],
            stock: vec![
                ("close", "Ibuprofen", 5, 2.0, "2025-06-01"),
                ("stocked", "Cetirizine", 5, 2.0, "2025-06-01"),
            ],
            query: "cetirizine",
            expected_ranking: vec![("stocked", 111.19)],
            expected_path: Some(vec!["USER", "stocked"]),
        },
        GoldenCase {
            id: "unlocated-pharmacy-is-skipped",
            user: (0.0, 0.0),
            sites: vec![("located", 0.0, 1.0)],
            stock: vec![("located", "Insulin", 2, 30.0, "2025-06-01")],
            query: "insulin",
            expected_ranking: vec![("located", 111.19)],
            expected_path: Some(vec!["USER", "located"]),
        },
        GoldenCase {
            id: "no-match",
            user: (0.0, 0.0),
            sites: vec![("p1", 0.0, 1.0)],
            stock: vec![("p1", "Aspirin", 1, 1.0, "2025-06-01")],
            query: "morphine",
            expected_ranking: vec![],
            expected_path: None,
        },
    ]
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn load(case: &GoldenCase) -> PharmacyDirectory {
    let mut directory = PharmacyDirectory::new();
    for (id, lat, lon) in &case.sites {
        directory
            .upsert_pharmacy(
                PharmacyRecord::new(*id, format!("Pharmacy {}", id), "Main St")
                    .with_coordinates(*lat, *lon),
            )
            .unwrap();
    }
    // A registered pharmacy with no coordinates, stocking everything queried
    directory
        .upsert_pharmacy(PharmacyRecord::new("unmapped", "Unmapped", "Unknown"))
        .unwrap();
    directory
        .replace_inventory(
            "unmapped",
            vec![InventoryRow::new("unmapped", case.query, 99, 0.5, date("2025-01-01"))],
        )
        .unwrap();

    let mut by_pharmacy: Vec<(&str, Vec<InventoryRow>)> = Vec::new();
    for (id, name, units, price, expiry) in &case.stock {
        let row = InventoryRow::new(*id, *name, *units, *price, date(expiry));
        match by_pharmacy.iter_mut().find(|(p, _)| p == id) {
            Some((_, rows)) => rows.push(row),
            None => by_pharmacy.push((*id, vec![row])),
        }
    }
    for (id, rows) in by_pharmacy {
        directory.replace_inventory(id, rows).unwrap();
    }
    directory
}

#[test]
fn test_golden_cases() {
    for algorithm in [PathAlgorithm::BinaryHeap, PathAlgorithm::Reference] {
        let locator = Locator::new(LocatorConfig {
            path_algorithm: algorithm,
            ..LocatorConfig::default()
        });

        for case in get_golden_cases() {
            let directory = load(&case);
            let user = Coordinate::new(case.user.0, case.user.1);

            let ranked = locator
                .search_medicine(&directory, user, case.query)
                .unwrap();
            let actual: Vec<(&str, f64)> = ranked
                .iter()
                .map(|r| (r.pharmacy_id.as_str(), r.distance_km))
                .collect();
            assert_eq!(
                actual, case.expected_ranking,
                "Case {}: ranking mismatch", case.id
            );

            match (&case.expected_path, locator.find_nearest_path(&directory, user, case.query)) {
                (Some(expected), Ok(nearest)) => {
                    assert_eq!(&nearest.path, expected, "Case {}: path mismatch", case.id);
                    assert_eq!(
                        nearest.pharmacy.id,
                        *expected.last().unwrap(),
                        "Case {}: pharmacy mismatch", case.id
                    );
                }
                (None, Err(LocatorError::NoPathFound(_))) => {}
                (expected, actual) => panic!(
                    "Case {} ({:?}): expected path {:?}, got {:?}",
                    case.id, algorithm, expected, actual
                ),
            }
        }
    }
}

#[test]
fn test_batches_merge_per_pharmacy() {
    let mut directory = PharmacyDirectory::new();
    directory
        .upsert_pharmacy(
            PharmacyRecord::new("p1", "Corner", "1 Main St").with_coordinates(0.0, 0.01),
        )
        .unwrap();
    directory
        .replace_inventory(
            "p1",
            vec![
                InventoryRow::new("p1", "Paracetamol", 30, 12.0, date("2025-08-01")),
                InventoryRow::new("p1", "Paracetamol", 20, 9.5, date("2025-06-01")),
                InventoryRow::new("p1", "Paracetamol Syrup", 4, 6.0, date("2026-01-01")),
            ],
        )
        .unwrap();

    let ranked = Locator::default()
        .search_medicine(&directory, Coordinate::new(0.0, 0.0), "paracetamol")
        .unwrap();

    assert_eq!(ranked.len(), 1);
    let medicines = &ranked[0].medicines;
    assert_eq!(medicines.len(), 2);
    assert_eq!(medicines[0].medicine_name, "Paracetamol");
    assert_eq!(medicines[0].total_stock, 50);
    assert_eq!(medicines[0].best_price, 9.5);
    assert_eq!(medicines[0].earliest_expiry, date("2025-06-01"));
    assert_eq!(medicines[1].medicine_name, "Paracetamol Syrup");
}

#[test]
fn test_distance_ranking_beats_hop_count() {
    // Both stocking pharmacies are one hop from the user, so only the
    // distance ranking is guaranteed to pick the closer one.
    let mut directory = PharmacyDirectory::new();
    for (id, lon) in [("a-far", 2.0), ("b-near", 1.0)] {
        directory
            .upsert_pharmacy(PharmacyRecord::new(id, id, "Main St").with_coordinates(0.0, lon))
            .unwrap();
        directory
            .replace_inventory(
                id,
                vec![InventoryRow::new(id, "Aspirin", 1, 1.0, date("2025-06-01"))],
            )
            .unwrap();
    }
    let user = Coordinate::new(0.0, 0.0);

    let by_distance = Locator::default()
        .find_nearest_path(&directory, user, "aspirin")
        .unwrap();
    assert_eq!(by_distance.pharmacy.id, "b-near");

    let by_hops = Locator::new(LocatorConfig {
        path_ranking: PathRanking::HopCount,
        ..LocatorConfig::default()
    })
    .find_nearest_path(&directory, user, "aspirin")
    .unwrap();
    assert_eq!(by_hops.pharmacy.id, "a-far");
    assert_eq!(by_hops.hops(), 1);
}

#[test]
fn test_autocomplete_tracks_uploads() {
    let mut directory = PharmacyDirectory::new();
    directory
        .upsert_pharmacy(
            PharmacyRecord::new("p1", "Corner", "1 Main St").with_coordinates(0.0, 1.0),
        )
        .unwrap();
    let locator = Locator::default();

    let names: Vec<String> = (0..15).map(|i| format!("Paracetamol {:02}", i)).collect();
    let rows = names
        .iter()
        .map(|name| InventoryRow::new("p1", name.as_str(), 1, 1.0, date("2025-06-01")))
        .collect();
    let update = directory.replace_inventory("p1", rows).unwrap();
    assert!(update.catalog_changed);
    locator.rebuild_catalog(directory.medicine_catalog());

    let suggestions = locator.suggest("PARA");
    assert_eq!(suggestions.len(), 10);
    assert_eq!(suggestions[0], "paracetamol 00");
    assert!(suggestions.iter().all(|s| s.starts_with("para")));
    assert!(locator.suggest("xyz").is_empty());
}
