//! Engine tuning parameters.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::haversine::DEFAULT_SPEED_MPH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Assumed driving speed for straight-line estimates.
    pub average_speed_mph: f64,
    /// Slack inserted after every job.
    pub buffer_minutes: u32,
    /// First departure from base (minutes after midnight).
    pub workday_start_minute: u32,
    /// Jobs within this distance of a cluster's centroid join it.
    pub cluster_radius_miles: f64,
    /// Workload-balance prefers alternatives once a technician passes this
    /// multiple of the mean jobs-per-technician ratio.
    pub overload_factor: f64,
    /// Customer-satisfaction strategy grants a proximity bonus inside this band.
    pub satisfaction_proximity_miles: f64,
    /// Max 2-opt passes after nearest-neighbour ordering.
    pub route_improvement_iterations: usize,
    /// Tolerance before a travel leg counts as infeasible.
    pub travel_slack_minutes: f64,
    /// Attach paired assistants to lead assignments.
    pub assign_assistants: bool,
    pub pairing: PairingConfig,
    pub recommendations: RecommendationThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            average_speed_mph: DEFAULT_SPEED_MPH,
            buffer_minutes: 15,
            workday_start_minute: 8 * 60,
            cluster_radius_miles: 15.0,
            overload_factor: 1.2,
            satisfaction_proximity_miles: 50.0,
            route_improvement_iterations: 50,
            travel_slack_minutes: 0.0,
            assign_assistants: true,
            pairing: PairingConfig::default(),
            recommendations: RecommendationThresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.average_speed_mph > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "average_speed_mph must be positive, got {}",
                self.average_speed_mph
            )));
        }
        if self.workday_start_minute >= 24 * 60 {
            return Err(EngineError::InvalidConfig(format!(
                "workday_start_minute must fall within a day, got {}",
                self.workday_start_minute
            )));
        }
        if !(self.cluster_radius_miles >= 0.0) {
            return Err(EngineError::InvalidConfig(
                "cluster_radius_miles must not be negative".to_string(),
            ));
        }
        if !(self.overload_factor >= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "overload_factor must be at least 1.0, got {}",
                self.overload_factor
            )));
        }
        if !(self.travel_slack_minutes >= 0.0) {
            return Err(EngineError::InvalidConfig(
                "travel_slack_minutes must not be negative".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.pairing.min_compatibility) {
            return Err(EngineError::InvalidConfig(format!(
                "pairing.min_compatibility must be within 0-100, got {}",
                self.pairing.min_compatibility
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Minimum compatibility score (0–100) for a lead/assistant pairing.
    pub min_compatibility: f64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            min_compatibility: 60.0,
        }
    }
}

/// Thresholds that trigger plain-language recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub workload_variance: f64,
    /// Utilization (0–1) below which capacity is flagged as idle.
    pub low_utilization: f64,
    /// Utilization (0–1) above which the team is flagged as stretched.
    pub high_utilization: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            workload_variance: 2.0,
            low_utilization: 0.6,
            high_utilization: 0.9,
        }
    }
}
