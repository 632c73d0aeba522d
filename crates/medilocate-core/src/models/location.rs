//! Location models for pharmacies and query origins.

use serde::{Deserialize, Serialize};

use crate::geo;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check the coordinate is finite and within [-90,90]/[-180,180].
    pub fn is_valid(&self) -> bool {
        geo::is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Haversine distance to another coordinate in kilometers.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        geo::distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A node that can be placed on the location graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocatedEntity {
    /// Unique within a single resolution request
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocatedEntity {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A pharmacy as registered in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PharmacyRecord {
    /// Directory identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Street address as entered by the pharmacy
    pub address: String,
    /// Geocoded latitude, absent if geocoding failed at registration
    pub latitude: Option<f64>,
    /// Geocoded longitude, absent if geocoding failed at registration
    pub longitude: Option<f64>,
}

impl PharmacyRecord {
    /// Create a new pharmacy record without coordinates.
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// Builder-style setter for coordinates.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Valid coordinates, or `None` if missing or out of range.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.latitude?, self.longitude?);
        coordinate.is_valid().then_some(coordinate)
    }

    /// Project onto the graph, skipping pharmacies that cannot be located.
    pub fn located(&self) -> Option<LocatedEntity> {
        self.coordinate()
            .map(|c| LocatedEntity::new(self.id.clone(), c.latitude, c.longitude))
    }
}
