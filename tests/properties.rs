mod common;

use astria::config::Config;
use astria::index::SpatialIndex;
use astria::maneuver::{fuel_mass_kg, Decision, ManeuverPlanner};
use astria::risk::{CollisionProbabilityModel, RiskAssessment, RiskFactors, UncertaintyInflation};
use astria::screening::{ConjunctionScreener, Thresholds, Tier};
use astria::state::{distance, Catalog, CatalogEntry, ObjectClass, ObjectId, StateVector};
use proptest::prelude::*;

fn factors(d: f64, sigma: f64) -> RiskFactors {
    RiskFactors {
        miss_distance_km: d,
        relative_speed_km_s: 0.0,
        combined_uncertainty_km: sigma,
    }
}

fn offsets() -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-80.0f64..80.0), 1..200)
}

proptest! {
    #[test]
    fn prop_screen_returns_exactly_objects_inside_safety(offsets in offsets()) {
        let host = common::scenario_host();
        let entries = offsets
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let r = [host.r[0] + o[0], host.r[1] + o[1], host.r[2] + o[2]];
                CatalogEntry::new(i as u32 + 1, StateVector::new(r, host.v, 0.0), ObjectClass::Debris)
            })
            .collect();
        let catalog = Catalog::new(entries).unwrap();
        let index = SpatialIndex::build(&catalog, 0.0).unwrap();
        let screener = ConjunctionScreener::new(Thresholds::default());
        let candidates = screener.screen(&index, &host).unwrap();

        let expected = catalog.iter().filter(|e| distance(&e.state.r, &host.r) < 50.0).count();
        prop_assert_eq!(candidates.len(), expected);
        for c in &candidates {
            prop_assert!(c.distance_km < 50.0);
            prop_assert_eq!(c.tier == Tier::Critical, c.distance_km < 10.0);
        }
        for pair in candidates.windows(2) {
            prop_assert!(pair[0].distance_km <= pair[1].distance_km);
            prop_assert!(pair[0].tier >= pair[1].tier);
        }
    }

    #[test]
    fn prop_risk_bounded(d in 0.0f64..60.0, sigma in 0.0f64..20.0) {
        let p = UncertaintyInflation::default().probability(&factors(d, sigma), &Thresholds::default());
        prop_assert!((0.0..=0.99).contains(&p));
    }

    #[test]
    fn prop_risk_non_increasing_in_distance(d in 0.0f64..55.0, step in 0.0f64..10.0, sigma in 0.0f64..10.0) {
        let model = UncertaintyInflation::default();
        let t = Thresholds::default();
        let near = model.probability(&factors(d, sigma), &t);
        let far = model.probability(&factors(d + step, sigma), &t);
        prop_assert!(far <= near + 1e-12, "d={} -> {}, d={} -> {}", d, near, d + step, far);
    }

    #[test]
    fn prop_risk_non_decreasing_in_uncertainty(d in 0.01f64..55.0, sigma in 0.0f64..10.0, step in 0.0f64..10.0) {
        let model = UncertaintyInflation::default();
        let t = Thresholds::default();
        let tight = model.probability(&factors(d, sigma), &t);
        let loose = model.probability(&factors(d, sigma + step), &t);
        prop_assert!(loose + 1e-12 >= tight);
    }

    #[test]
    fn prop_fuel_strictly_increasing_in_delta_v(dv in 0.0f64..100.0, extra in 1e-6f64..10.0) {
        prop_assert!(fuel_mass_kg(12.0, 60.0, dv + extra) > fuel_mass_kg(12.0, 60.0, dv));
    }

    #[test]
    fn prop_below_threshold_is_no_action_without_fuel(p in 0.0f64..0.5, d in 0.0f64..50.0) {
        let planner = ManeuverPlanner::from_config(&Config::default()).unwrap();
        let assessment = RiskAssessment {
            object_id: ObjectId(1),
            tier: Tier::classify(d, &Thresholds::default()),
            probability_of_collision: p,
            miss_distance_km: d,
            relative_speed_km_s: 0.0,
            combined_uncertainty_km: 3.0,
            covariance_supplied: false,
            time_to_closest_approach_s: None,
            relative_position_km: [0.0, d, 0.0],
        };
        let plan = planner.plan(&assessment, &common::scenario_host(), 1.0).unwrap();
        prop_assert_eq!(plan.decision, Decision::NoAction);
        prop_assert_eq!(plan.estimated_fuel_consumed_kg, 0.0);
        prop_assert!(!plan.is_burn());
    }

    #[test]
    fn prop_planned_burn_fits_remaining_fuel(d in 0.5f64..6.0, remaining in 0.0f64..0.3) {
        let planner = ManeuverPlanner::from_config(&Config::default()).unwrap();
        let assessment = RiskAssessment {
            object_id: ObjectId(2),
            tier: Tier::Critical,
            probability_of_collision: 0.95,
            miss_distance_km: d,
            relative_speed_km_s: 0.0,
            combined_uncertainty_km: 3.0,
            covariance_supplied: false,
            time_to_closest_approach_s: None,
            relative_position_km: [0.0, 0.0, d],
        };
        match planner.plan(&assessment, &common::scenario_host(), remaining) {
            Ok(plan) => {
                prop_assert_eq!(plan.decision, Decision::PlanManeuver);
                prop_assert!(plan.estimated_fuel_consumed_kg <= remaining);
            }
            Err(err) => {
                let detail = err.infeasibility().unwrap();
                prop_assert!(detail.required_fuel_kg > remaining);
            }
        }
    }
}
