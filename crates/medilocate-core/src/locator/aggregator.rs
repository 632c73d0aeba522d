//! Turns raw inventory rows into a distance-ranked pharmacy list.
//!
//! Rows are filtered by a case-insensitive substring of the medicine name,
//! grouped by pharmacy, then by exact medicine name. Each medicine group
//! collapses to total stock, lowest price and earliest expiry.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::geo;
use crate::models::{
    AggregatedMedicine, Coordinate, InventoryRow, PharmacyRecord, RankedPharmacyResult,
};

/// Running totals for one medicine at one pharmacy.
#[derive(Debug, Clone)]
struct MedicineTotals {
    name: String,
    total_stock: u64,
    best_price: f64,
    earliest_expiry: NaiveDate,
}

impl MedicineTotals {
    fn start(row: &InventoryRow) -> Self {
        Self {
            name: row.medicine_name.clone(),
            total_stock: u64::from(row.stock),
            best_price: row.price,
            earliest_expiry: row.expiry_date,
        }
    }

    fn merge(&mut self, row: &InventoryRow) {
        let batch = row.batch();
        self.total_stock += u64::from(row.stock);
        self.best_price = self.best_price.min(batch.price);
        self.earliest_expiry = self.earliest_expiry.min(batch.expiry_date);
    }

    fn finish(self) -> AggregatedMedicine {
        AggregatedMedicine {
            medicine_name: self.name,
            total_stock: self.total_stock,
            best_price: self.best_price,
            earliest_expiry: self.earliest_expiry,
        }
    }
}

/// Matching medicines at one pharmacy, in first-seen order.
struct PharmacyGroup<'a> {
    pharmacy: &'a PharmacyRecord,
    distance_km: f64,
    medicines: Vec<MedicineTotals>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> PharmacyGroup<'a> {
    fn add(&mut self, row: &'a InventoryRow) {
        match self.positions.get(row.medicine_name.as_str()) {
            Some(&i) => self.medicines[i].merge(row),
            None => {
                self.positions
                    .insert(row.medicine_name.as_str(), self.medicines.len());
                self.medicines.push(MedicineTotals::start(row));
            }
        }
    }
}

/// Rank pharmacies stocking medicines whose name contains `name_filter`.
///
/// Pharmacies unknown to `pharmacies`, or without valid coordinates, are
/// skipped. Distances are rounded to `decimals` places and the list is
/// stably sorted by that rounded distance, so ties keep first-seen order.
/// No match yields an empty list.
pub fn aggregate<'a, R, P>(
    rows: R,
    pharmacies: P,
    user_location: Coordinate,
    name_filter: &str,
    decimals: u32,
) -> Vec<RankedPharmacyResult>
where
    R: IntoIterator<Item = &'a InventoryRow>,
    P: IntoIterator<Item = &'a PharmacyRecord>,
{
    let directory: HashMap<&str, &PharmacyRecord> =
        pharmacies.into_iter().map(|p| (p.id.as_str(), p)).collect();
    let needle = name_filter.to_lowercase();

    let mut groups: Vec<PharmacyGroup<'a>> = Vec::new();
    let mut group_positions: HashMap<&str, usize> = HashMap::new();
    let mut matched_rows = 0usize;
    let mut unlocated = 0usize;

    for row in rows {
        if !row.medicine_name.to_lowercase().contains(&needle) {
            continue;
        }
        matched_rows += 1;

        let position = match group_positions.get(row.pharmacy_id.as_str()) {
            Some(&i) => i,
            None => {
                let Some(pharmacy) = directory.get(row.pharmacy_id.as_str()).copied() else {
                    continue;
                };
                let Some(coordinate) = pharmacy.coordinate() else {
                    unlocated += 1;
                    continue;
                };
                let distance = geo::round_to(user_location.distance_to(&coordinate), decimals);
                groups.push(PharmacyGroup {
                    pharmacy,
                    distance_km: distance,
                    medicines: Vec::new(),
                    positions: HashMap::new(),
                });
                group_positions.insert(pharmacy.id.as_str(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[position].add(row);
    }

    let mut results: Vec<RankedPharmacyResult> = groups
        .into_iter()
        .filter(|group| !group.medicines.is_empty())
        .map(|group| RankedPharmacyResult {
            pharmacy_id: group.pharmacy.id.clone(),
            pharmacy_name: group.pharmacy.name.clone(),
            pharmacy_address: group.pharmacy.address.clone(),
            distance_km: group.distance_km,
            medicines: group.medicines.into_iter().map(MedicineTotals::finish).collect(),
        })
        .collect();

    results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    debug!(
        matched_rows,
        unlocated_rows = unlocated,
        pharmacies = results.len(),
        "aggregated inventory"
    );
    results
}
