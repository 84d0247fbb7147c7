//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chanscope::model::Channel;
use chanscope::store::RecordStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const POINTS_HEADER: &str = "Lat,Lon,WiFi Channel";

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

pub fn store(points: &[(f64, f64, Channel)]) -> RecordStore {
    RecordStore::from_points(points.iter().copied()).expect("valid fixture points")
}

/// Random points spread over the globe with channels drawn from a small
/// set, so same-channel pairs are common.
pub fn random_store(n: usize, seed: u64) -> RecordStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let channels = [Channel::Number(1), Channel::Number(6), Channel::Number(11), Channel::Unknown];
    let points: Vec<(f64, f64, Channel)> = (0..n)
        .map(|_| {
            (
                rng.gen_range(-90.0..=90.0),
                rng.gen_range(-180.0..=180.0),
                channels[rng.gen_range(0..channels.len())],
            )
        })
        .collect();
    RecordStore::from_points(points).expect("generated points are in range")
}

/// The four-point layout used throughout the closest-point tests.
pub fn four_points() -> RecordStore {
    store(&[
        (0.0, 0.0, Channel::Number(1)),
        (0.0, 1.0, Channel::Number(1)),
        (1.0, 0.0, Channel::Number(2)),
        (10.0, 10.0, Channel::Number(2)),
    ])
}
