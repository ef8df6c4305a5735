//! Conjunction screening: proximity → tiered candidates.
//!
//! Tiers are a pure function of distance and two fixed thresholds:
//! - `critical` — distance < critical threshold
//! - `close`    — critical threshold ≤ distance < safety threshold
//! - `nominal`  — everything else; never emitted
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::index::{SpatialIndex, EPOCH_TOLERANCE_S};
use crate::state::{CatalogEntry, StateVector};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScreenError {
    #[error("index was built for epoch {index_epoch}, host state is at {host_epoch}")]
    EpochMismatch { index_epoch: f64, host_epoch: f64 },
}

/// Validated distance thresholds (km), `0 < critical < safety`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    safety_km: f64,
    critical_km: f64,
}

impl Thresholds {
    pub fn new(safety_km: f64, critical_km: f64) -> Result<Self, ConfigError> {
        if critical_km.is_finite() && safety_km.is_finite() && critical_km > 0.0 && critical_km < safety_km {
            Ok(Thresholds { safety_km, critical_km })
        } else {
            Err(ConfigError::InvalidThreshold { critical_km, safety_km })
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.safety_threshold_km, config.critical_threshold_km)
    }

    pub fn safety_km(&self) -> f64 {
        self.safety_km
    }

    pub fn critical_km(&self) -> f64 {
        self.critical_km
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { safety_km: 50.0, critical_km: 10.0 }
    }
}

/// Severity tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Nominal,
    Close,
    Critical,
}

impl Tier {
    pub fn classify(distance_km: f64, thresholds: &Thresholds) -> Tier {
        if distance_km < thresholds.critical_km {
            Tier::Critical
        } else if distance_km < thresholds.safety_km {
            Tier::Close
        } else {
            Tier::Nominal
        }
    }
}

/// An object inside the safety bubble this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConjunctionCandidate {
    pub entry: CatalogEntry,
    pub distance_km: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConjunctionScreener {
    thresholds: Thresholds,
}

impl ConjunctionScreener {
    pub fn new(thresholds: Thresholds) -> Self {
        ConjunctionScreener { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Candidates within the safety threshold of the host, nearest first.
    pub fn screen(
        &self,
        index: &SpatialIndex<'_>,
        host: &StateVector,
    ) -> Result<Vec<ConjunctionCandidate>, ScreenError> {
        if (index.epoch() - host.epoch).abs() > EPOCH_TOLERANCE_S {
            return Err(ScreenError::EpochMismatch {
                index_epoch: index.epoch(),
                host_epoch: host.epoch,
            });
        }

        let mut candidates: Vec<ConjunctionCandidate> = index
            .query_radius(&host.r, self.thresholds.safety_km)
            .into_iter()
            .filter_map(|n| match Tier::classify(n.distance_km, &self.thresholds) {
                Tier::Nominal => None,
                tier => Some(ConjunctionCandidate {
                    entry: n.entry.clone(),
                    distance_km: n.distance_km,
                    tier,
                }),
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });

        debug!(
            screened = index.len(),
            critical = candidates.iter().filter(|c| c.tier == Tier::Critical).count(),
            close = candidates.iter().filter(|c| c.tier == Tier::Close).count(),
            "screening complete"
        );
        Ok(candidates)
    }
}
