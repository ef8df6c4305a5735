//! Per-cycle decision output.
//!
//! Field names are part of the serialized schema consumed by telemetry and
//! hardware-in-the-loop harnesses; renaming one is a breaking change.
use serde::{Deserialize, Serialize};

use crate::maneuver::{Decision, ManeuverPlan};
use crate::risk::RiskAssessment;
use crate::screening::{ConjunctionCandidate, Tier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub candidate: ConjunctionCandidate,
    pub assessment: RiskAssessment,
    /// Present for `monitor` and `plan_maneuver` decisions only.
    pub plan: Option<ManeuverPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub objects_screened: usize,
    pub critical_count: usize,
    pub close_count: usize,
    pub max_risk: f64,
    pub maneuvers_planned: usize,
    pub monitored: usize,
    pub infeasible: usize,
    pub fuel_committed_kg: f64,
}

impl CycleSummary {
    fn tally(objects_screened: usize, entries: &[DecisionEntry]) -> Self {
        let mut summary = CycleSummary {
            objects_screened,
            ..CycleSummary::default()
        };
        for entry in entries {
            match entry.candidate.tier {
                Tier::Critical => summary.critical_count += 1,
                Tier::Close => summary.close_count += 1,
                Tier::Nominal => {}
            }
            summary.max_risk = summary.max_risk.max(entry.assessment.probability_of_collision);
            if let Some(plan) = &entry.plan {
                match plan.decision {
                    Decision::PlanManeuver => summary.maneuvers_planned += 1,
                    Decision::Monitor => summary.monitored += 1,
                    Decision::NoAction => {}
                }
                if plan.infeasible.is_some() {
                    summary.infeasible += 1;
                }
                summary.fuel_committed_kg += plan.estimated_fuel_consumed_kg;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub cycle: u64,
    pub epoch: f64,
    /// Highest risk first.
    pub entries: Vec<DecisionEntry>,
    pub summary: CycleSummary,
}

impl DecisionRecord {
    pub fn new(cycle: u64, epoch: f64, objects_screened: usize, mut entries: Vec<DecisionEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.assessment
                .probability_of_collision
                .total_cmp(&a.assessment.probability_of_collision)
                .then_with(|| a.candidate.distance_km.total_cmp(&b.candidate.distance_km))
                .then_with(|| a.candidate.entry.id.cmp(&b.candidate.entry.id))
        });
        let summary = CycleSummary::tally(objects_screened, &entries);
        DecisionRecord {
            cycle,
            epoch,
            entries,
            summary,
        }
    }

    pub fn empty(cycle: u64, epoch: f64) -> Self {
        Self::new(cycle, epoch, 0, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn plans(&self) -> impl Iterator<Item = &ManeuverPlan> {
        self.entries.iter().filter_map(|e| e.plan.as_ref())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CycleStatus {
    Completed,
    Aborted { reason: String },
    Cancelled,
}

/// What a cycle hands to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub status: CycleStatus,
    /// This cycle's record, or the last good one when `carried_forward`.
    pub record: Option<DecisionRecord>,
    pub carried_forward: bool,
}

impl CycleReport {
    pub fn is_completed(&self) -> bool {
        self.status == CycleStatus::Completed
    }
}
