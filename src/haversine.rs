//! Haversine distance helpers and the default distance matrix provider.
//!
//! Uses great-circle distance to estimate travel. Less accurate than a road
//! router (ignores roads) but always available.

use rayon::prelude::*;

use crate::models::Coordinates;
use crate::traits::{DistanceMatrixProvider, TravelLeg};

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_MPH: f64 = 30.0;

/// Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance between two coordinates in miles.
pub fn calculate_distance(from: Coordinates, to: Coordinates) -> f64 {
    haversine_miles((from.lat, from.lng), (to.lat, to.lng))
}

/// Haversine distance between two (lat, lng) points in miles.
pub fn haversine_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

/// Convert a distance in miles to driving minutes at the given speed.
pub fn miles_to_minutes(miles: f64, speed_mph: f64) -> f64 {
    miles / speed_mph * 60.0
}

/// Haversine-based distance matrix provider.
///
/// Estimates travel time using straight-line distance and an assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in mph.
    pub speed_mph: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_mph: DEFAULT_SPEED_MPH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_mph: f64) -> Self {
        Self { speed_mph }
    }

    /// Travel leg between two points.
    pub fn leg(&self, from: (f64, f64), to: (f64, f64)) -> TravelLeg {
        let miles = haversine_miles(from, to);
        TravelLeg {
            distance_miles: miles,
            duration_minutes: miles_to_minutes(miles, self.speed_mph),
        }
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<TravelLeg>> {
        locations
            .par_iter()
            .enumerate()
            .map(|(i, from)| {
                locations
                    .iter()
                    .enumerate()
                    .map(|(j, to)| if i == j { TravelLeg::ZERO } else { self.leg(*from, *to) })
                    .collect()
            })
            .collect()
    }
}
