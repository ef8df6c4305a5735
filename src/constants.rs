//! Physical and astrodynamic constants.

/// Earth gravitational parameter (km³/s²) — WGS84
pub const MU_EARTH: f64 = 398600.4418;

/// Earth equatorial radius (km) — WGS84
pub const R_EARTH: f64 = 6378.137;

/// Standard gravity used by the small-burn rocket equation (m/s²)
pub const G0: f64 = 9.81;

/// Kilometres to metres
pub const KM_TO_M: f64 = 1000.0;

/// Two pi
pub const TAU: f64 = std::f64::consts::TAU;

/// Largest collision probability ever reported.
///
/// Certainty is not physically meaningful for a tracked object, so 1.0 is never emitted.
pub const MAX_REPORTED_PROBABILITY: f64 = 0.99;
