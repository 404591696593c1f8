//! Haversine distance matrix provider (fallback when the mapping service is
//! unavailable).
//!
//! Uses great-circle distance to estimate travel distance and time.
//! Less accurate than a road network but always available.

use crate::matrix::TravelMatrices;
use crate::traits::{DistanceMatrixProvider, TravelMode};

/// Average driving speed assumed for time estimates (50 km/h).
pub const AVERAGE_SPEED_MPS: f64 = 13.89;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Great-circle distance in whole meters (truncated).
pub fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> u32 {
    (haversine_km(from, to) * 1000.0) as u32
}

/// Travel time in whole seconds for a distance at the average speed.
pub fn meters_to_seconds(meters: u64) -> u64 {
    (meters as f64 / AVERAGE_SPEED_MPS) as u64
}

/// Haversine-based distance matrix provider.
///
/// Ignores the travel mode; every pair is estimated geometrically.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl HaversineMatrix {
    /// Estimated (meters, seconds) for one pair.
    pub fn estimate(from: (f64, f64), to: (f64, f64)) -> (u32, u32) {
        let meters = haversine_meters(from, to);
        (meters, meters_to_seconds(u64::from(meters)) as u32)
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)], _mode: TravelMode) -> TravelMatrices {
        let n = locations.len();
        let mut matrices = TravelMatrices::zeros(n);

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    let (meters, seconds) = Self::estimate(*from, *to);
                    matrices.distances.set(i, j, meters);
                    matrices.durations.set(i, j, seconds);
                }
            }
        }
        matrices.estimated_cells = n * n.saturating_sub(1);

        matrices
    }
}
