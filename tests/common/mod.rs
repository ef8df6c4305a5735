#![allow(dead_code)]

use astria::constants::{MU_EARTH, R_EARTH, TAU};
use astria::state::{Catalog, CatalogEntry, ObjectClass, StateVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Host on a circular equatorial orbit at 550 km.
pub fn host(epoch: f64) -> StateVector {
    circular(R_EARTH + 550.0, 0.0, 0.0, epoch)
}

/// Host used by the worked scenarios: r = 6921 km along +x.
pub fn scenario_host() -> StateVector {
    StateVector::new([6921.0, 0.0, 0.0], [0.0, 7.589, 0.0], 0.0)
}

/// Object co-moving with the scenario host at `r`.
pub fn co_moving(id: u32, r: [f64; 3]) -> CatalogEntry {
    CatalogEntry::new(id, StateVector::new(r, [0.0, 7.589, 0.0], 0.0), ObjectClass::Debris)
}

/// Circular orbit of radius `radius_km`, inclination `inc` and argument of
/// latitude `u` (radians), ascending node on +x.
pub fn circular(radius_km: f64, inc: f64, u: f64, epoch: f64) -> StateVector {
    let speed = (MU_EARTH / radius_km).sqrt();
    let (su, cu) = u.sin_cos();
    let (si, ci) = inc.sin_cos();
    StateVector::new(
        [radius_km * cu, radius_km * su * ci, radius_km * su * si],
        [-speed * su, speed * cu * ci, speed * cu * si],
        epoch,
    )
}

/// Reproducible LEO population: debris and operational objects spread over
/// 400–800 km shells at random inclinations.
pub fn synthetic_catalog(seed: u64, debris: usize, operational: usize, epoch: f64) -> Catalog {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut entries = Vec::with_capacity(debris + operational);
    for i in 0..debris + operational {
        let altitude = rng.gen_range(400.0..800.0);
        let inc = rng.gen_range(0.0..std::f64::consts::PI);
        let u = rng.gen_range(0.0..TAU);
        let class = if i < debris {
            ObjectClass::Debris
        } else {
            ObjectClass::Operational
        };
        entries.push(CatalogEntry::new(
            10_000 + i as u32,
            circular(R_EARTH + altitude, inc, u, epoch),
            class,
        ));
    }
    Catalog::new(entries).expect("synthetic ids are unique")
}

/// Objects scattered uniformly inside a cube of half-width `half_km` around
/// `centre`, all co-moving with the host.
pub fn cloud_around(seed: u64, centre: &StateVector, count: usize, half_km: f64) -> Catalog {
    let mut rng = StdRng::seed_from_u64(seed);
    let entries = (0..count)
        .map(|i| {
            let r = [
                centre.r[0] + rng.gen_range(-half_km..half_km),
                centre.r[1] + rng.gen_range(-half_km..half_km),
                centre.r[2] + rng.gen_range(-half_km..half_km),
            ];
            CatalogEntry::new(
                i as u32 + 1,
                StateVector::new(r, centre.v, centre.epoch),
                ObjectClass::Unknown,
            )
        })
        .collect();
    Catalog::new(entries).expect("ids are unique")
}
