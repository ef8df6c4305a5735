//! Collision risk assessment for screened candidates.
//!
//! The score combines deterministic geometry with tracking uncertainty:
//!
//! ```text
//! close base     = w · (1 - d / safety)                    w = 0.2
//! critical base  = max(1 - d / critical, close base)
//! score          = clamp(base · (1 + g · σ / d), 0, 0.99)
//! ```
//!
//! where `σ` is the combined 1-sigma of host and object position projected on
//! the line of sight, taken from the object's covariance or the configured
//! default when none is supplied. The score is non-increasing in `d` and
//! non-decreasing in `σ`. Relative velocity only feeds time of closest
//! approach.
//!
//! The mapping from factors to probability sits behind
//! [`CollisionProbabilityModel`] so a conjunction-plane integration can
//! replace the default without touching the pipeline.
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::constants::MAX_REPORTED_PROBABILITY;
use crate::relative::RelativeState;
use crate::screening::{ConjunctionCandidate, Thresholds, Tier};
use crate::state::{ObjectId, StateVector, Vec3};

/// Weight of the close-tier decay relative to the critical-tier ramp.
pub const CLOSE_TIER_WEIGHT: f64 = 0.2;

/// Distances are floored here before dividing (km).
const MIN_DISTANCE_KM: f64 = 1e-6;

/// Inputs a probability model may use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub miss_distance_km: f64,
    pub relative_speed_km_s: f64,
    pub combined_uncertainty_km: f64,
}

pub trait CollisionProbabilityModel: Send + Sync + fmt::Debug {
    /// Collision probability in [0, 0.99]. Must be deterministic.
    fn probability(&self, factors: &RiskFactors, thresholds: &Thresholds) -> f64;
}

/// Distance-only base risk, continuous across the tier boundary.
pub fn base_risk(distance_km: f64, thresholds: &Thresholds) -> f64 {
    let close = CLOSE_TIER_WEIGHT * (1.0 - distance_km / thresholds.safety_km()).clamp(0.0, 1.0);
    if distance_km < thresholds.critical_km() {
        let critical = (1.0 - distance_km / thresholds.critical_km()).clamp(0.0, 1.0);
        critical.max(close)
    } else {
        close
    }
}

/// Clamp into the reportable range; NaN is treated as maximal risk.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        MAX_REPORTED_PROBABILITY
    } else {
        p.clamp(0.0, MAX_REPORTED_PROBABILITY)
    }
}

/// Default model: base risk inflated by uncertainty relative to distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncertaintyInflation {
    pub gain: f64,
}

impl Default for UncertaintyInflation {
    fn default() -> Self {
        UncertaintyInflation { gain: 3.0 }
    }
}

impl CollisionProbabilityModel for UncertaintyInflation {
    fn probability(&self, factors: &RiskFactors, thresholds: &Thresholds) -> f64 {
        let base = base_risk(factors.miss_distance_km, thresholds);
        let d = factors.miss_distance_km.max(MIN_DISTANCE_KM);
        let sigma = factors.combined_uncertainty_km.max(0.0);
        clamp_probability(base * (1.0 + self.gain * sigma / d))
    }
}

/// Risk of one candidate, keyed back to it by object id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub object_id: ObjectId,
    pub tier: Tier,
    pub probability_of_collision: f64,
    pub miss_distance_km: f64,
    pub relative_speed_km_s: f64,
    pub combined_uncertainty_km: f64,
    /// False when the default uncertainty stood in for a missing covariance.
    pub covariance_supplied: bool,
    /// Straight-line time to closest approach (s), if there is relative motion.
    pub time_to_closest_approach_s: Option<f64>,
    /// Object minus host position, ECI (km).
    pub relative_position_km: Vec3,
}

impl RiskAssessment {
    /// How much the geometry dominates the uncertainty, in [0, 1].
    pub fn confidence(&self) -> f64 {
        let total = self.miss_distance_km + self.combined_uncertainty_km;
        if total <= 0.0 {
            1.0
        } else {
            self.miss_distance_km / total
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskAssessor<M = UncertaintyInflation> {
    thresholds: Thresholds,
    default_uncertainty_km: f64,
    host_uncertainty_km: f64,
    model: M,
}

impl RiskAssessor<UncertaintyInflation> {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(RiskAssessor {
            thresholds: Thresholds::from_config(config)?,
            default_uncertainty_km: config.default_uncertainty_km,
            host_uncertainty_km: config.host_uncertainty_km,
            model: UncertaintyInflation { gain: config.uncertainty_gain },
        })
    }
}

impl<M: CollisionProbabilityModel> RiskAssessor<M> {
    pub fn new(thresholds: Thresholds, default_uncertainty_km: f64, host_uncertainty_km: f64, model: M) -> Self {
        RiskAssessor {
            thresholds,
            default_uncertainty_km,
            host_uncertainty_km,
            model,
        }
    }

    /// Swap the probability model, keeping thresholds and uncertainties.
    pub fn with_model<N: CollisionProbabilityModel>(self, model: N) -> RiskAssessor<N> {
        RiskAssessor {
            thresholds: self.thresholds,
            default_uncertainty_km: self.default_uncertainty_km,
            host_uncertainty_km: self.host_uncertainty_km,
            model,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Combined 1-sigma (km) of host and object along `line_of_sight`.
    pub fn combined_uncertainty(&self, candidate: &ConjunctionCandidate, line_of_sight: &Vec3) -> f64 {
        let object_var = match &candidate.entry.covariance {
            Some(cov) => cov.variance_along(line_of_sight),
            None => self.default_uncertainty_km.powi(2),
        };
        (object_var + self.host_uncertainty_km.powi(2)).sqrt()
    }

    pub fn assess(&self, candidate: &ConjunctionCandidate, host: &StateVector) -> RiskAssessment {
        let relative = RelativeState::between(host, &candidate.entry.state);
        let sigma = self.combined_uncertainty(candidate, &relative.position);
        let factors = RiskFactors {
            miss_distance_km: candidate.distance_km,
            relative_speed_km_s: relative.speed(),
            combined_uncertainty_km: sigma,
        };

        RiskAssessment {
            object_id: candidate.entry.id,
            tier: candidate.tier,
            probability_of_collision: clamp_probability(self.model.probability(&factors, &self.thresholds)),
            miss_distance_km: factors.miss_distance_km,
            relative_speed_km_s: factors.relative_speed_km_s,
            combined_uncertainty_km: sigma,
            covariance_supplied: candidate.entry.covariance.is_some(),
            time_to_closest_approach_s: relative.time_to_closest_approach(),
            relative_position_km: relative.position,
        }
    }

    /// Assess every candidate in parallel; output order matches input order.
    pub fn assess_all(&self, candidates: &[ConjunctionCandidate], host: &StateVector) -> Vec<RiskAssessment> {
        candidates.par_iter().map(|c| self.assess(c, host)).collect()
    }
}
