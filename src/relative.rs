//! Host-relative geometry and linearised relative motion.
//!
//! The host's RIC frame (radial, in-track, cross-track) is built from its
//! ECI state. Relative motion uses the straight-line approximation for time
//! of closest approach and Clohessy-Wiltshire responses for impulsive burns:
//!
//! ```text
//! radial impulse:      x = sin(nt)/n · Δv        y = 2(cos(nt) - 1)/n · Δv
//! in-track impulse:    x = 2(1 - cos(nt))/n · Δv  y = (4 sin(nt) - 3nt)/n · Δv
//! cross-track impulse: z = sin(nt)/n · Δv
//! ```
use serde::{Deserialize, Serialize};

use crate::state::{cross, dot, norm, scale, sub, StateVector, Vec3};

/// Relative speeds below this (km/s) carry no usable closing geometry.
const MIN_RELATIVE_SPEED: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RicAxis {
    Radial,
    InTrack,
    CrossTrack,
}

/// Orthonormal RIC basis of the host orbit, expressed in ECI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RicFrame {
    pub radial: Vec3,
    pub in_track: Vec3,
    pub cross_track: Vec3,
}

impl RicFrame {
    /// Build the frame from a host state. `None` if position and velocity
    /// are parallel or zero, where no orbital plane exists.
    pub fn from_state(host: &StateVector) -> Option<Self> {
        let r_mag = host.r_mag();
        let h = cross(&host.r, &host.v);
        let h_mag = norm(&h);
        if r_mag <= f64::EPSILON || h_mag <= f64::EPSILON * r_mag.max(1.0) {
            return None;
        }
        let radial = scale(&host.r, 1.0 / r_mag);
        let cross_track = scale(&h, 1.0 / h_mag);
        let in_track = cross(&cross_track, &radial);
        Some(RicFrame { radial, in_track, cross_track })
    }

    /// Components of an ECI vector along [radial, in-track, cross-track].
    pub fn project(&self, eci: &Vec3) -> Vec3 {
        [dot(eci, &self.radial), dot(eci, &self.in_track), dot(eci, &self.cross_track)]
    }

    pub fn axis(&self, axis: RicAxis) -> Vec3 {
        match axis {
            RicAxis::Radial => self.radial,
            RicAxis::InTrack => self.in_track,
            RicAxis::CrossTrack => self.cross_track,
        }
    }
}

/// Object state relative to the host (object minus host), ECI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeState {
    /// Relative position (km)
    pub position: Vec3,
    /// Relative velocity (km/s)
    pub velocity: Vec3,
}

impl RelativeState {
    pub fn between(host: &StateVector, object: &StateVector) -> Self {
        RelativeState {
            position: sub(&object.r, &host.r),
            velocity: sub(&object.v, &host.v),
        }
    }

    pub fn range(&self) -> f64 {
        norm(&self.position)
    }

    pub fn speed(&self) -> f64 {
        norm(&self.velocity)
    }

    /// Time until closest approach (s) under straight-line relative motion.
    ///
    /// `Some(0.0)` when the object is already receding, `None` when there is
    /// no relative motion to extrapolate.
    pub fn time_to_closest_approach(&self) -> Option<f64> {
        time_to_closest_approach(&self.position, &self.velocity)
    }
}

/// Straight-line time of closest approach for a relative position/velocity pair.
pub fn time_to_closest_approach(position: &Vec3, velocity: &Vec3) -> Option<f64> {
    let v2 = dot(velocity, velocity);
    if v2.sqrt() < MIN_RELATIVE_SPEED {
        return None;
    }
    Some((-dot(position, velocity) / v2).max(0.0))
}

/// Axis carrying the largest share of a RIC relative position.
///
/// In-track wins ties, then radial: in-track phasing is the cheapest
/// correction in LEO.
pub fn dominant_axis(ric: &Vec3) -> RicAxis {
    let [r, i, c] = [ric[0].abs(), ric[1].abs(), ric[2].abs()];
    if i >= r && i >= c {
        RicAxis::InTrack
    } else if r >= c {
        RicAxis::Radial
    } else {
        RicAxis::CrossTrack
    }
}

/// Separation reachable per unit impulsive Δv along `axis` after `lead_s` seconds.
///
/// Units are km per km/s, i.e. seconds. `n` is the host mean motion (rad/s).
/// Radial and cross-track responses are periodic, so the peak reachable
/// displacement within the lead time is used; the in-track response grows
/// secularly and is taken directly.
pub fn displacement_gain(axis: RicAxis, n: f64, lead_s: f64) -> f64 {
    if lead_s <= 0.0 || n <= 0.0 {
        return 0.0;
    }
    let theta = n * lead_s;
    match axis {
        RicAxis::InTrack => {
            let x = 2.0 * (1.0 - theta.cos());
            let y = 4.0 * theta.sin() - 3.0 * theta;
            (x * x + y * y).sqrt() / n
        }
        RicAxis::Radial => {
            let th = theta.min(std::f64::consts::PI);
            let x = th.sin();
            let y = 2.0 * (th.cos() - 1.0);
            (x * x + y * y).sqrt() / n
        }
        RicAxis::CrossTrack => theta.min(std::f64::consts::FRAC_PI_2).sin() / n,
    }
}
