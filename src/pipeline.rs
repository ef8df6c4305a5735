//! One screening cycle end to end.
//!
//! ```text
//! provider → spatial index → screener → risk assessor → planner → record
//! ```
//!
//! A cycle either completes and yields a fresh [`DecisionRecord`], or it is
//! aborted/cancelled and the last good record is carried forward. Nothing is
//! partially applied: propellant debited by a cycle that is cancelled before
//! it completes is credited back.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use crate::config::{Config, ConfigError};
use crate::fuel::{FuelError, FuelTracker};
use crate::index::{IndexError, SpatialIndex};
use crate::maneuver::{Decision, Infeasibility, ManeuverError, ManeuverPlan, ManeuverPlanner};
use crate::provider::{ProviderError, StateProvider};
use crate::record::{CycleReport, CycleStatus, DecisionEntry, DecisionRecord};
use crate::relative::RicFrame;
use crate::risk::{CollisionProbabilityModel, RiskAssessment, RiskAssessor, UncertaintyInflation};
use crate::screening::{ConjunctionScreener, ScreenError, Thresholds};
use crate::state::StateVector;

/// Reasons a cycle does not complete.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("host state is unusable: {0}")]
    InvalidHostState(&'static str),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Screen(#[from] ScreenError),

    #[error("cycle cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag, checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CycleError> {
        if self.is_cancelled() {
            Err(CycleError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct Pipeline<M = UncertaintyInflation> {
    config: Config,
    screener: ConjunctionScreener,
    assessor: RiskAssessor<M>,
    planner: ManeuverPlanner,
    cycle: u64,
    last_record: Option<DecisionRecord>,
}

impl Pipeline<UncertaintyInflation> {
    /// Validate the configuration and assemble the stages.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Pipeline {
            screener: ConjunctionScreener::new(Thresholds::from_config(&config)?),
            assessor: RiskAssessor::from_config(&config)?,
            planner: ManeuverPlanner::from_config(&config)?,
            config,
            cycle: 0,
            last_record: None,
        })
    }
}

impl<M: CollisionProbabilityModel> Pipeline<M> {
    /// Replace the collision probability model.
    pub fn with_model<N: CollisionProbabilityModel>(self, model: N) -> Pipeline<N> {
        Pipeline {
            config: self.config,
            screener: self.screener,
            assessor: self.assessor.with_model(model),
            planner: self.planner,
            cycle: self.cycle,
            last_record: self.last_record,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Most recent completed record, if any cycle has completed.
    pub fn last_record(&self) -> Option<&DecisionRecord> {
        self.last_record.as_ref()
    }

    /// Run one cycle. Never panics on per-cycle failures; they are reported
    /// in the returned status.
    pub fn run_cycle<P, F>(&mut self, provider: &P, fuel: &F, cancel: &CancelToken) -> CycleReport
    where
        P: StateProvider + ?Sized,
        F: FuelTracker + ?Sized,
    {
        self.cycle += 1;
        let cycle = self.cycle;
        let _span = info_span!("cycle", cycle).entered();

        match self.evaluate(cycle, provider, fuel, cancel) {
            Ok(record) => {
                let s = &record.summary;
                info!(
                    screened = s.objects_screened,
                    critical = s.critical_count,
                    close = s.close_count,
                    max_risk = s.max_risk,
                    maneuvers = s.maneuvers_planned,
                    monitored = s.monitored,
                    infeasible = s.infeasible,
                    fuel_kg = s.fuel_committed_kg,
                    "cycle complete"
                );
                self.last_record = Some(record.clone());
                CycleReport {
                    cycle,
                    status: CycleStatus::Completed,
                    record: Some(record),
                    carried_forward: false,
                }
            }
            Err(CycleError::Cancelled) => {
                warn!("cycle cancelled, partial record discarded");
                self.carry_forward(cycle, CycleStatus::Cancelled)
            }
            Err(err) => {
                error!(error = %err, "cycle aborted");
                self.carry_forward(cycle, CycleStatus::Aborted { reason: err.to_string() })
            }
        }
    }

    fn carry_forward(&self, cycle: u64, status: CycleStatus) -> CycleReport {
        let record = self.last_record.clone();
        if let Some(previous) = &record {
            warn!(from_cycle = previous.cycle, "carrying forward last decision record");
        }
        CycleReport {
            cycle,
            status,
            carried_forward: record.is_some(),
            record,
        }
    }

    fn evaluate<P, F>(
        &self,
        cycle: u64,
        provider: &P,
        fuel: &F,
        cancel: &CancelToken,
    ) -> Result<DecisionRecord, CycleError>
    where
        P: StateProvider + ?Sized,
        F: FuelTracker + ?Sized,
    {
        cancel.check()?;
        let snapshot = provider.snapshot()?;
        let host = snapshot.host;
        if !host.is_finite() {
            return Err(CycleError::InvalidHostState("non-finite position or velocity"));
        }
        if host.altitude() <= 0.0 {
            return Err(CycleError::InvalidHostState("position is inside the Earth"));
        }
        if RicFrame::from_state(&host).is_none() {
            return Err(CycleError::InvalidHostState("position and velocity are parallel"));
        }

        let index = match SpatialIndex::build(&snapshot.catalog, host.epoch) {
            Ok(index) => index,
            Err(IndexError::EmptyCatalog) => {
                debug!("empty catalog, nothing to screen");
                return Ok(DecisionRecord::empty(cycle, host.epoch));
            }
            Err(err) => return Err(err.into()),
        };
        let candidates = self.screener.screen(&index, &host)?;
        cancel.check()?;

        let assessments = self.assessor.assess_all(&candidates, &host);
        cancel.check()?;

        // Highest risk gets first claim on the propellant.
        let mut order: Vec<usize> = (0..assessments.len()).collect();
        order.sort_by(|&a, &b| {
            assessments[b]
                .probability_of_collision
                .total_cmp(&assessments[a].probability_of_collision)
                .then_with(|| assessments[a].miss_distance_km.total_cmp(&assessments[b].miss_distance_km))
        });

        let mut plans: Vec<Option<ManeuverPlan>> = vec![None; assessments.len()];
        let mut debited_kg = 0.0;
        for i in order {
            if cancel.is_cancelled() {
                refund(fuel, debited_kg);
                return Err(CycleError::Cancelled);
            }
            plans[i] = self.plan_one(&assessments[i], &host, fuel, &mut debited_kg);
        }
        if cancel.is_cancelled() {
            refund(fuel, debited_kg);
            return Err(CycleError::Cancelled);
        }

        let entries = candidates
            .into_iter()
            .zip(assessments)
            .zip(plans)
            .map(|((candidate, assessment), plan)| DecisionEntry {
                candidate,
                assessment,
                plan,
            })
            .collect();
        Ok(DecisionRecord::new(cycle, host.epoch, snapshot.catalog.len(), entries))
    }

    /// Plan for one assessment, debiting propellant for an accepted burn.
    /// Infeasible burns come back as monitor plans carrying the reason.
    fn plan_one<F: FuelTracker + ?Sized>(
        &self,
        assessment: &RiskAssessment,
        host: &StateVector,
        fuel: &F,
        debited_kg: &mut f64,
    ) -> Option<ManeuverPlan> {
        let lead_s = self.planner.lead_time_s(assessment);
        let plan = match self.planner.plan(assessment, host, fuel.remaining_kg()) {
            Ok(plan) => plan,
            Err(err @ ManeuverError::Infeasible { .. }) => {
                warn!(object_id = %assessment.object_id, error = %err, "maneuver infeasible, monitoring instead");
                return err
                    .infeasibility()
                    .map(|detail| ManeuverPlan::downgraded(assessment, lead_s, detail));
            }
            Err(err) => {
                error!(object_id = %assessment.object_id, error = %err, "maneuver planning failed, monitoring instead");
                return Some(ManeuverPlan::hold(assessment, Decision::Monitor, lead_s));
            }
        };

        match plan.decision {
            Decision::NoAction => None,
            Decision::Monitor => Some(plan),
            Decision::PlanManeuver => match fuel.try_debit(plan.estimated_fuel_consumed_kg) {
                Ok(remaining_kg) => {
                    *debited_kg += plan.estimated_fuel_consumed_kg;
                    info!(
                        object_id = %plan.object_id,
                        strategy = ?plan.strategy,
                        delta_v_m_s = plan.delta_v_magnitude_m_s,
                        fuel_kg = plan.estimated_fuel_consumed_kg,
                        remaining_kg,
                        "avoidance maneuver planned"
                    );
                    Some(plan)
                }
                Err(err) => {
                    let available_fuel_kg = match err {
                        FuelError::Insufficient { available_kg, .. } => available_kg,
                        FuelError::InvalidAmount(_) => fuel.remaining_kg(),
                    };
                    warn!(object_id = %plan.object_id, error = %err, "propellant debit refused, monitoring instead");
                    Some(ManeuverPlan::downgraded(
                        assessment,
                        lead_s,
                        Infeasibility {
                            requested_strategy: plan.strategy,
                            required_delta_v_m_s: plan.delta_v_magnitude_m_s,
                            required_fuel_kg: plan.estimated_fuel_consumed_kg,
                            available_fuel_kg,
                        },
                    ))
                }
            },
        }
    }
}

fn refund<F: FuelTracker + ?Sized>(fuel: &F, kg: f64) {
    if kg <= 0.0 {
        return;
    }
    match fuel.credit(kg) {
        Ok(remaining_kg) => debug!(refunded_kg = kg, remaining_kg, "propellant returned"),
        Err(err) => error!(error = %err, "failed to return propellant"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::FuelBudget;
    use crate::provider::{ScriptedProvider, Snapshot};
    use crate::state::{Catalog, CatalogEntry, ObjectClass};

    fn host(epoch: f64) -> StateVector {
        StateVector::new([6921.0, 0.0, 0.0], [0.0, 7.589, 0.0], epoch)
    }

    fn snapshot_with(positions: &[[f64; 3]], epoch: f64) -> Snapshot {
        let entries = positions
            .iter()
            .enumerate()
            .map(|(i, r)| {
                CatalogEntry::new(i as u32 + 1, StateVector::new(*r, [0.0, 7.589, 0.0], epoch), ObjectClass::Debris)
            })
            .collect();
        Snapshot::new(host(epoch), Catalog::new(entries).unwrap())
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = Config {
            critical_threshold_km: 60.0,
            ..Config::default()
        };
        assert!(matches!(Pipeline::new(config), Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn test_cycle_numbers_advance() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let provider = ScriptedProvider::new();
        provider.push_snapshot(snapshot_with(&[[6921.0, 20.0, 0.0]], 0.0));
        provider.push_snapshot(snapshot_with(&[[6921.0, 20.0, 0.0]], 60.0));
        let fuel = FuelBudget::new(1.0).unwrap();
        let cancel = CancelToken::new();

        let first = pipeline.run_cycle(&provider, &fuel, &cancel);
        let second = pipeline.run_cycle(&provider, &fuel, &cancel);
        assert_eq!(first.cycle, 1);
        assert_eq!(second.cycle, 2);
        assert_eq!(second.record.unwrap().epoch, 60.0);
    }

    #[test]
    fn test_degenerate_host_aborts() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let provider = ScriptedProvider::new();
        let mut snapshot = snapshot_with(&[[6921.0, 5.0, 0.0]], 0.0);
        snapshot.host.v = [1.0, 0.0, 0.0];
        provider.push_snapshot(snapshot);

        let report = pipeline.run_cycle(&provider, &FuelBudget::new(1.0).unwrap(), &CancelToken::new());
        assert!(matches!(report.status, CycleStatus::Aborted { .. }));
        assert!(report.record.is_none());
        assert!(!report.carried_forward);
    }

    #[test]
    fn test_host_inside_earth_aborts() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let provider = ScriptedProvider::new();
        let mut snapshot = snapshot_with(&[[6000.0, 5.0, 0.0]], 0.0);
        snapshot.host.r = [6000.0, 0.0, 0.0];
        provider.push_snapshot(snapshot);

        let report = pipeline.run_cycle(&provider, &FuelBudget::new(1.0).unwrap(), &CancelToken::new());
        match report.status {
            CycleStatus::Aborted { reason } => assert!(reason.contains("inside the Earth"), "{reason}"),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_pre_cancelled_cycle_touches_nothing() {
        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let provider = ScriptedProvider::new();
        provider.push_snapshot(snapshot_with(&[[6921.0, 3.0, 0.0]], 0.0));
        let fuel = FuelBudget::new(1.0).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = pipeline.run_cycle(&provider, &fuel, &cancel);
        assert_eq!(report.status, CycleStatus::Cancelled);
        assert_eq!(fuel.remaining_kg(), 1.0);
        // The snapshot was never consumed
        assert_eq!(provider.pending(), 1);
    }
}
