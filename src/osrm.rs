//! OSRM HTTP adapter for road-network distance matrices.

use serde::Deserialize;

use crate::traits::{DistanceMatrixProvider, TravelLeg};

const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, locations: &[(f64, f64)]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.config.base_url, self.config.profile, coords
        )
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<TravelLeg>> {
        if locations.is_empty() {
            return Vec::new();
        }

        let response = self
            .client
            .get(self.table_url(locations))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>());

        match response {
            Ok(body) => body.into_legs(),
            Err(err) => {
                tracing::warn!(error = %err, "OSRM table request failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    /// Combine the duration (seconds) and distance (meters) tables.
    ///
    /// Unroutable pairs come back as null and are treated as unreachable.
    fn into_legs(self) -> Vec<Vec<TravelLeg>> {
        let (Some(durations), Some(distances)) = (self.durations, self.distances) else {
            return Vec::new();
        };
        if durations.len() != distances.len() {
            return Vec::new();
        }

        durations
            .into_iter()
            .zip(distances)
            .map(|(duration_row, distance_row)| {
                duration_row
                    .into_iter()
                    .zip(distance_row)
                    .map(|(seconds, meters)| TravelLeg {
                        distance_miles: meters.map_or(f64::INFINITY, |m| m / METERS_PER_MILE),
                        duration_minutes: seconds.map_or(f64::INFINITY, |s| s / 60.0),
                    })
                    .collect()
            })
            .collect()
    }
}
