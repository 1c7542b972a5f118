#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrain_contour::{Point3, PointSet};

pub const CONE_POINTS: usize = 10_000;

/// Apex height of the synthetic cone at `(x, z)`.
pub fn cone_height(x: f64, z: f64) -> f64 {
    5.0 - 0.5 * (x * x + z * z).sqrt()
}

/// `n` points sampled uniformly over `[-5, 5]²` on the cone surface.
pub fn cone(n: usize, seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.gen_range(-5.0..5.0);
            let z = rng.gen_range(-5.0..5.0);
            Point3::new(x, cone_height(x, z), z)
        })
        .collect()
}

/// Points on a regular XZ lattice with heights from `height`.
pub fn lattice<F: Fn(usize) -> f64>(nx: usize, nz: usize, height: F) -> PointSet {
    let mut pts = Vec::with_capacity(nx * nz);
    for i in 0..nx {
        for j in 0..nz {
            pts.push(Point3::new(i as f64, height(i * nz + j), j as f64));
        }
    }
    PointSet::new(pts)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
