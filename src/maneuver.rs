//! Collision avoidance maneuver planning.
//!
//! Each assessment walks a three-state decision:
//! - `no_action`     — risk below the maneuver threshold
//! - `monitor`       — maneuver threshold ≤ risk < act threshold; a zero-burn
//!                     plan is still produced for audit continuity
//! - `plan_maneuver` — risk ≥ act threshold
//!
//! A planned burn goes along whichever RIC axis carries the largest share of
//! the relative position (in-track phasing on ties, the cheapest option in
//! LEO). Its size comes from the Clohessy-Wiltshire displacement reachable by
//! closest approach, and its propellant from the small-burn rocket equation:
//!
//!   m_fuel ≈ m_sat · Δv / (g0 · Isp)
//!
//! A burn the remaining budget cannot cover is reported as infeasible, never
//! scaled down. An object already past closest approach is only monitored:
//! the separation is opening without spending propellant.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::constants::*;
use crate::relative::{displacement_gain, dominant_axis, RicAxis, RicFrame};
use crate::risk::RiskAssessment;
use crate::state::{scale, ObjectId, StateVector, Vec3};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManeuverError {
    #[error("maneuver for object {object_id} needs {required_fuel_kg} kg of propellant, {available_fuel_kg} kg available")]
    Infeasible {
        object_id: ObjectId,
        strategy: Strategy,
        delta_v_m_s: f64,
        required_fuel_kg: f64,
        available_fuel_kg: f64,
    },

    #[error("host state has no orbital plane (position and velocity are parallel)")]
    DegenerateGeometry,
}

impl ManeuverError {
    /// Audit detail for a plan downgraded because of this error.
    pub fn infeasibility(&self) -> Option<Infeasibility> {
        match *self {
            ManeuverError::Infeasible {
                strategy,
                delta_v_m_s,
                required_fuel_kg,
                available_fuel_kg,
                ..
            } => Some(Infeasibility {
                requested_strategy: strategy,
                required_delta_v_m_s: delta_v_m_s,
                required_fuel_kg,
                available_fuel_kg,
            }),
            ManeuverError::DegenerateGeometry => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    NoAction,
    Monitor,
    PlanManeuver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    InTrackPhasing,
    RadialBurn,
    CrossTrackBurn,
    NoAction,
}

impl Strategy {
    pub fn for_axis(axis: RicAxis) -> Self {
        match axis {
            RicAxis::InTrack => Strategy::InTrackPhasing,
            RicAxis::Radial => Strategy::RadialBurn,
            RicAxis::CrossTrack => Strategy::CrossTrackBurn,
        }
    }
}

/// Why a wanted burn was not planned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Infeasibility {
    pub requested_strategy: Strategy,
    pub required_delta_v_m_s: f64,
    pub required_fuel_kg: f64,
    pub available_fuel_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverPlan {
    pub object_id: ObjectId,
    pub decision: Decision,
    pub strategy: Strategy,
    /// Impulse in ECI (m/s). Zero unless a burn is planned.
    pub delta_v_m_s: Vec3,
    pub delta_v_magnitude_m_s: f64,
    /// Lead time of the burn before closest approach (s).
    pub time_to_execute_s: f64,
    pub estimated_fuel_consumed_kg: f64,
    pub confidence: f64,
    /// Set when a burn was wanted but could not be afforded.
    pub infeasible: Option<Infeasibility>,
}

impl ManeuverPlan {
    /// Zero-burn plan carrying a decision through to the record.
    pub fn hold(assessment: &RiskAssessment, decision: Decision, lead_s: f64) -> Self {
        ManeuverPlan {
            object_id: assessment.object_id,
            decision,
            strategy: Strategy::NoAction,
            delta_v_m_s: [0.0; 3],
            delta_v_magnitude_m_s: 0.0,
            time_to_execute_s: lead_s,
            estimated_fuel_consumed_kg: 0.0,
            confidence: assessment.confidence(),
            infeasible: None,
        }
    }

    /// Monitor-only plan standing in for a burn that could not be afforded.
    pub fn downgraded(assessment: &RiskAssessment, lead_s: f64, infeasibility: Infeasibility) -> Self {
        ManeuverPlan {
            infeasible: Some(infeasibility),
            ..Self::hold(assessment, Decision::Monitor, lead_s)
        }
    }

    pub fn is_burn(&self) -> bool {
        self.strategy != Strategy::NoAction
    }
}

/// Propellant for a small impulsive burn (kg).
pub fn fuel_mass_kg(satellite_mass_kg: f64, specific_impulse_s: f64, delta_v_m_s: f64) -> f64 {
    satellite_mass_kg * delta_v_m_s.max(0.0) / (G0 * specific_impulse_s)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverPlanner {
    maneuver_threshold: f64,
    act_threshold: f64,
    satellite_mass_kg: f64,
    specific_impulse_s: f64,
    target_miss_distance_km: f64,
    default_lead_time_s: f64,
}

impl ManeuverPlanner {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(ManeuverPlanner {
            maneuver_threshold: config.maneuver_threshold,
            act_threshold: config.act_threshold,
            satellite_mass_kg: config.satellite_mass_kg,
            specific_impulse_s: config.specific_impulse_s,
            target_miss_distance_km: config.target_miss_distance_km,
            default_lead_time_s: config.default_lead_time_s,
        })
    }

    pub fn decide(&self, probability: f64) -> Decision {
        if probability >= self.act_threshold {
            Decision::PlanManeuver
        } else if probability >= self.maneuver_threshold {
            Decision::Monitor
        } else {
            Decision::NoAction
        }
    }

    pub fn fuel_for(&self, delta_v_m_s: f64) -> f64 {
        fuel_mass_kg(self.satellite_mass_kg, self.specific_impulse_s, delta_v_m_s)
    }

    /// Burn lead time: extrapolated closest approach, or the configured
    /// default when there is none ahead.
    pub fn lead_time_s(&self, assessment: &RiskAssessment) -> f64 {
        assessment
            .time_to_closest_approach_s
            .filter(|t| *t > 0.0)
            .unwrap_or(self.default_lead_time_s)
    }

    /// Extra separation needed at closest approach (km): out to the target
    /// miss distance, plus one combined sigma.
    pub fn required_displacement_km(&self, assessment: &RiskAssessment) -> f64 {
        (self.target_miss_distance_km - assessment.miss_distance_km).max(0.0) + assessment.combined_uncertainty_km
    }

    /// Plan against one assessment given the propellant currently available.
    pub fn plan(
        &self,
        assessment: &RiskAssessment,
        host: &StateVector,
        remaining_fuel_kg: f64,
    ) -> Result<ManeuverPlan, ManeuverError> {
        let lead_s = self.lead_time_s(assessment);
        let decision = self.decide(assessment.probability_of_collision);
        if decision != Decision::PlanManeuver {
            return Ok(ManeuverPlan::hold(assessment, decision, lead_s));
        }
        if is_receding(assessment) {
            return Ok(ManeuverPlan::hold(assessment, Decision::Monitor, lead_s));
        }

        let frame = RicFrame::from_state(host).ok_or(ManeuverError::DegenerateGeometry)?;
        let ric = frame.project(&assessment.relative_position_km);
        let axis = dominant_axis(&ric);
        let strategy = Strategy::for_axis(axis);

        let gain_s = displacement_gain(axis, host.mean_motion(), lead_s);
        let dv_m_s = if gain_s > 0.0 {
            self.required_displacement_km(assessment) / gain_s * KM_TO_M
        } else {
            f64::INFINITY
        };
        let fuel_kg = self.fuel_for(dv_m_s);

        if !fuel_kg.is_finite() || fuel_kg > remaining_fuel_kg {
            return Err(ManeuverError::Infeasible {
                object_id: assessment.object_id,
                strategy,
                delta_v_m_s: dv_m_s,
                required_fuel_kg: fuel_kg,
                available_fuel_kg: remaining_fuel_kg,
            });
        }

        let delta_v = scale(&frame.axis(axis), burn_sign(axis, &ric) * dv_m_s);
        Ok(ManeuverPlan {
            object_id: assessment.object_id,
            decision,
            strategy,
            delta_v_m_s: delta_v,
            delta_v_magnitude_m_s: dv_m_s,
            time_to_execute_s: lead_s,
            estimated_fuel_consumed_kg: fuel_kg,
            confidence: assessment.confidence(),
            infeasible: None,
        })
    }
}

fn is_receding(assessment: &RiskAssessment) -> bool {
    matches!(assessment.time_to_closest_approach_s, Some(t) if t <= 0.0)
}

/// Burn direction along `axis` that opens separation.
///
/// Radial and cross-track impulses move the host along the impulse within
/// the first half orbit, so burn away from the object. An in-track impulse
/// is dominated by its secular drift, which runs opposite to the impulse, so
/// burn toward it.
fn burn_sign(axis: RicAxis, ric: &Vec3) -> f64 {
    let (component, toward) = match axis {
        RicAxis::Radial => (ric[0], false),
        RicAxis::InTrack => (ric[1], true),
        RicAxis::CrossTrack => (ric[2], false),
    };
    let side = if component < 0.0 { -1.0 } else { 1.0 };
    if toward {
        side
    } else {
        -side
    }
}
