//! Locator configuration.
//!
//! Defaults match the behavior of the production service. Values can be
//! loaded from JSON (missing fields fall back to defaults) or from
//! `MEDILOCATE_*` environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::PathAlgorithm;
use crate::index::DEFAULT_SUGGESTION_LIMIT;

/// Synthetic node id for the user's location.
pub const DEFAULT_ORIGIN_ID: &str = "USER";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How the path-to-nearest query picks among reachable candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathRanking {
    /// Lowest cumulative distance wins
    #[default]
    Distance,
    /// Fewest hops wins, first candidate on ties (legacy behavior)
    HopCount,
}

impl std::str::FromStr for PathRanking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(PathRanking::Distance),
            "hop_count" | "hops" => Ok(PathRanking::HopCount),
            other => Err(format!("unknown path ranking '{}'", other)),
        }
    }
}

/// Settings for [`Locator`](crate::locator::Locator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Maximum autocomplete suggestions
    pub suggestion_limit: usize,
    /// Shortest-path engine
    pub path_algorithm: PathAlgorithm,
    /// Candidate selection for path-to-nearest
    pub path_ranking: PathRanking,
    /// Id of the synthetic origin node
    pub origin_id: String,
    /// Decimal places kept in reported distances
    pub distance_decimals: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            path_algorithm: PathAlgorithm::default(),
            path_ranking: PathRanking::default(),
            origin_id: DEFAULT_ORIGIN_ID.to_string(),
            distance_decimals: 2,
        }
    }
}

impl LocatorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `MEDILOCATE_*` environment variables, defaulting the rest.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing is testable without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("MEDILOCATE_SUGGESTION_LIMIT") {
            config.suggestion_limit = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                invalid("MEDILOCATE_SUGGESTION_LIMIT", e.to_string())
            })?;
        }
        if let Some(raw) = lookup("MEDILOCATE_PATH_ALGORITHM") {
            config.path_algorithm = raw
                .parse()
                .map_err(|e| invalid("MEDILOCATE_PATH_ALGORITHM", e))?;
        }
        if let Some(raw) = lookup("MEDILOCATE_PATH_RANKING") {
            config.path_ranking = raw
                .parse()
                .map_err(|e| invalid("MEDILOCATE_PATH_RANKING", e))?;
        }
        if let Some(raw) = lookup("MEDILOCATE_ORIGIN_ID") {
            config.origin_id = raw.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the locator cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.suggestion_limit == 0 {
            return Err(invalid("suggestion_limit", "must be at least 1"));
        }
        if self.origin_id.trim().is_empty() {
            return Err(invalid("origin_id", "must not be empty"));
        }
        if self.distance_decimals > 6 {
            return Err(invalid("distance_decimals", "must be 6 or fewer"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}
