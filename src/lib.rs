//! # ASTRIA
//!
//! **A**utonomous **S**pacecraft **T**raffic **R**isk **I**dentification & **A**voidance
//!
//! Onboard collision avoidance for small satellites. Each screening cycle
//! takes the host's state and a catalog of tracked objects at one epoch and:
//! 1. indexes catalog positions in a k-d tree and screens for objects inside
//!    the safety bubble, tiered `close` / `critical`;
//! 2. scores each candidate's collision risk from miss distance and
//!    tracking uncertainty;
//! 3. decides between no action, monitoring and an avoidance burn, sizing
//!    the burn and its propellant against a shared fuel budget.
//!
//! Catalog acquisition and orbit propagation are external; see
//! [`provider::StateProvider`].
//!
//! ```
//! use astria::config::Config;
//! use astria::fuel::FuelBudget;
//! use astria::pipeline::{CancelToken, Pipeline};
//! use astria::provider::{ScriptedProvider, Snapshot};
//! use astria::state::{Catalog, CatalogEntry, ObjectClass, StateVector};
//!
//! let host = StateVector::new([6921.0, 0.0, 0.0], [0.0, 7.589, 0.0], 0.0);
//! let debris = CatalogEntry::new(
//!     41_001,
//!     StateVector::new([6925.0, 3.0, 4.0], [0.0, 7.589, 0.0], 0.0),
//!     ObjectClass::Debris,
//! );
//! let provider = ScriptedProvider::new();
//! provider.push_snapshot(Snapshot::new(host, Catalog::new(vec![debris]).unwrap()));
//!
//! let mut pipeline = Pipeline::new(Config::default()).unwrap();
//! let fuel = FuelBudget::new(0.5).unwrap();
//! let report = pipeline.run_cycle(&provider, &fuel, &CancelToken::new());
//!
//! let record = report.record.unwrap();
//! assert_eq!(record.summary.critical_count, 1);
//! assert_eq!(record.summary.maneuvers_planned, 1);
//! ```

pub mod constants;
pub mod state;
pub mod relative;
pub mod config;
pub mod index;
pub mod screening;
pub mod risk;
pub mod maneuver;
pub mod fuel;
pub mod provider;
pub mod record;
pub mod pipeline;
pub mod logging;

pub use config::{Config, ConfigError};
pub use pipeline::{CancelToken, Pipeline};
pub use record::{CycleReport, CycleStatus, DecisionRecord};
