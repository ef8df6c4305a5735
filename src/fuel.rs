//! Propellant budget shared between screening cycles and maneuver execution.
//!
//! The budget is the only mutable state that outlives a cycle. It is passed
//! explicitly as a handle; every check-and-debit happens under one lock, so at
//! most one plan debits at a time.
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FuelError {
    #[error("insufficient propellant: requested {requested_kg} kg, {available_kg} kg available")]
    Insufficient { requested_kg: f64, available_kg: f64 },

    #[error("invalid propellant amount {0} kg")]
    InvalidAmount(f64),
}

/// Source of truth for remaining propellant.
pub trait FuelTracker: Send + Sync {
    /// Remaining propellant (kg).
    fn remaining_kg(&self) -> f64;

    /// Atomically debit `kg` if enough remains. Returns what is left.
    fn try_debit(&self, kg: f64) -> Result<f64, FuelError>;

    /// Return propellant from a debit that was never executed.
    fn credit(&self, kg: f64) -> Result<f64, FuelError>;
}

/// Thread-safe in-memory budget. Clones share the same tank.
#[derive(Debug, Clone)]
pub struct FuelBudget {
    remaining: Arc<Mutex<f64>>,
}

impl FuelBudget {
    pub fn new(initial_kg: f64) -> Result<Self, FuelError> {
        validate(initial_kg)?;
        Ok(FuelBudget {
            remaining: Arc::new(Mutex::new(initial_kg)),
        })
    }
}

impl FuelTracker for FuelBudget {
    fn remaining_kg(&self) -> f64 {
        *self.remaining.lock()
    }

    fn try_debit(&self, kg: f64) -> Result<f64, FuelError> {
        validate(kg)?;
        let mut remaining = self.remaining.lock();
        if kg > *remaining {
            return Err(FuelError::Insufficient {
                requested_kg: kg,
                available_kg: *remaining,
            });
        }
        *remaining -= kg;
        Ok(*remaining)
    }

    fn credit(&self, kg: f64) -> Result<f64, FuelError> {
        validate(kg)?;
        let mut remaining = self.remaining.lock();
        *remaining += kg;
        Ok(*remaining)
    }
}

fn validate(kg: f64) -> Result<(), FuelError> {
    if kg.is_finite() && kg >= 0.0 {
        Ok(())
    } else {
        Err(FuelError::InvalidAmount(kg))
    }
}
