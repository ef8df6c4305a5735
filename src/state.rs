//! Propagated states and the tracked-object catalog.
//!
//! Everything here is supplied by the state provider for a single epoch and is
//! never mutated afterwards. Positions are ECI kilometres, velocities km/s.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Catalog validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate catalog id {0}")]
    DuplicateId(ObjectId),

    #[error("Object {0} has a non-finite position or velocity")]
    NonFiniteState(ObjectId),

    #[error("Object {id} has an invalid covariance: {reason}")]
    InvalidCovariance { id: ObjectId, reason: &'static str },
}

// ── Vector helpers ──

/// Plain 3-vector, same layout as the state vector components.
pub type Vec3 = [f64; 3];

pub fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub fn scale(a: &Vec3, k: f64) -> Vec3 {
    [a[0] * k, a[1] * k, a[2] * k]
}

/// Euclidean distance between two points (km).
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    norm(&sub(a, b))
}

// ── State vector ──

/// Cartesian state vector in ECI frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Position (km): [x, y, z]
    pub r: Vec3,
    /// Velocity (km/s): [vx, vy, vz]
    pub v: Vec3,
    /// Epoch (seconds since reference)
    pub epoch: f64,
}

impl StateVector {
    pub fn new(r: Vec3, v: Vec3, epoch: f64) -> Self {
        StateVector { r, v, epoch }
    }

    /// Position magnitude (km).
    pub fn r_mag(&self) -> f64 {
        norm(&self.r)
    }

    /// Velocity magnitude (km/s).
    pub fn v_mag(&self) -> f64 {
        norm(&self.v)
    }

    /// Altitude above Earth surface (km).
    pub fn altitude(&self) -> f64 {
        self.r_mag() - R_EARTH
    }

    /// Specific orbital energy (km²/s²).
    pub fn energy(&self) -> f64 {
        self.v_mag().powi(2) / 2.0 - MU_EARTH / self.r_mag()
    }

    /// Semi-major axis from vis-viva (km).
    pub fn sma(&self) -> f64 {
        -MU_EARTH / (2.0 * self.energy())
    }

    /// Two-body mean motion (rad/s), falling back to the circular value
    /// at the current radius when the state is not bound.
    pub fn mean_motion(&self) -> f64 {
        let a = self.sma();
        let a = if a.is_finite() && a > 0.0 { a } else { self.r_mag() };
        (MU_EARTH / a.powi(3)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.r.iter().chain(self.v.iter()).all(|x| x.is_finite()) && self.epoch.is_finite()
    }
}

// ── Catalog ──

/// Stable catalog identifier (NORAD-style number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Debris,
    Operational,
    Unknown,
}

/// Symmetric 3×3 positional covariance (km²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Covariance(pub [[f64; 3]; 3]);

impl Covariance {
    /// Diagonal covariance with the same 1-sigma on every axis (km).
    pub fn isotropic(sigma_km: f64) -> Self {
        let var = sigma_km * sigma_km;
        Covariance([[var, 0.0, 0.0], [0.0, var, 0.0], [0.0, 0.0, var]])
    }

    pub fn diagonal(sigma_km: Vec3) -> Self {
        let mut m = [[0.0; 3]; 3];
        for (i, s) in sigma_km.iter().enumerate() {
            m[i][i] = s * s;
        }
        Covariance(m)
    }

    pub fn trace(&self) -> f64 {
        self.0[0][0] + self.0[1][1] + self.0[2][2]
    }

    /// Variance along a direction (km²). `dir` need not be normalised.
    /// Returns the mean axis variance when `dir` is zero.
    pub fn variance_along(&self, dir: &Vec3) -> f64 {
        let n = norm(dir);
        if n <= f64::EPSILON {
            return self.trace() / 3.0;
        }
        let u = scale(dir, 1.0 / n);
        let mut var = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                var += u[i] * self.0[i][j] * u[j];
            }
        }
        var.max(0.0)
    }

    fn validate(&self) -> Result<(), &'static str> {
        let m = &self.0;
        if m.iter().flatten().any(|x| !x.is_finite()) {
            return Err("non-finite element");
        }
        if (0..3).any(|i| m[i][i] < 0.0) {
            return Err("negative variance on the diagonal");
        }
        let tol = 1e-9 * self.trace().abs().max(1.0);
        for i in 0..3 {
            for j in (i + 1)..3 {
                if (m[i][j] - m[j][i]).abs() > tol {
                    return Err("matrix is not symmetric");
                }
            }
        }
        Ok(())
    }
}

/// One tracked object as supplied for the current epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ObjectId,
    pub state: StateVector,
    /// Positional tracking uncertainty, when the source provides one.
    pub covariance: Option<Covariance>,
    pub class: ObjectClass,
}

impl CatalogEntry {
    pub fn new(id: u32, state: StateVector, class: ObjectClass) -> Self {
        CatalogEntry {
            id: ObjectId(id),
            state,
            covariance: None,
            class,
        }
    }

    pub fn with_covariance(mut self, covariance: Covariance) -> Self {
        self.covariance = Some(covariance);
        self
    }
}

/// Validated catalog snapshot: ids are unique, states finite, covariances well formed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(CatalogError::DuplicateId(entry.id));
            }
            if !entry.state.is_finite() {
                return Err(CatalogError::NonFiniteState(entry.id));
            }
            if let Some(cov) = &entry.covariance {
                cov.validate()
                    .map_err(|reason| CatalogError::InvalidCovariance { id: entry.id, reason })?;
            }
        }
        Ok(Catalog { entries })
    }

    pub fn empty() -> Self {
        Catalog::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
