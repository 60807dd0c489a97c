//! Output records produced by an optimization run.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{Installation, OptimizationGoal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Assigned,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// One job placed on one lead's route (optionally with an assistant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedAssignment {
    pub id: String,
    pub installation_id: String,
    pub lead_id: String,
    pub assistant_id: Option<String>,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Minutes from the previous stop (or base for the first stop).
    pub estimated_travel_time: f64,
    /// Miles from the previous stop (or base for the first stop).
    pub estimated_travel_distance: f64,
    pub buffer_time: u32,
    /// Lead's job count on the date relative to capacity (0–1, above 1 when overbooked).
    pub workload_score: f64,
    /// 1.0 for a zero-distance leg, falling to 0.0 at the lead's travel radius.
    pub efficiency_score: f64,
    pub previous_job_id: Option<String>,
    pub next_job_id: Option<String>,
    pub status: AssignmentStatus,
    pub strategy: OptimizationGoal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// No active lead is available and qualified on the job date.
    NoEligibleTechnician,
    /// Every qualified lead is based too far from the job's cluster.
    OutsideTravelRadius,
    /// Distance-driven strategies cannot place ungeocoded jobs.
    MissingCoordinates,
    /// Dropped while removing a capacity overrun or a day that ran past midnight.
    CapacityExhausted,
    /// Dropped while removing an overlap or travel conflict.
    ConflictUnresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedJob {
    #[serde(flatten)]
    pub installation: Installation,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    IncompleteAddress,
    MissingScheduledDate,
    /// Zero, or longer than a day.
    InvalidDuration,
}

/// A job filtered out during validation, kept so every input is accounted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedJob {
    pub installation: Installation,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TimeOverlap,
    CapacityExceeded,
    TravelTimeInfeasible,
    /// Jobs pushed past midnight by the day's timeline.
    WorkdayOverrun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConflict {
    pub id: String,
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub technician_id: String,
    pub date: NaiveDate,
    pub assignment_ids: Vec<String>,
    pub installation_ids: Vec<String>,
    pub description: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    Underutilized,
    Optimal,
    Overloaded,
    Critical,
}

impl WorkloadStatus {
    /// Non-overlapping bands: above 100% critical, 90–100% overloaded,
    /// below 60% underutilized, otherwise optimal.
    pub fn from_utilization(percent: f64) -> Self {
        if percent > 100.0 {
            WorkloadStatus::Critical
        } else if percent >= 90.0 {
            WorkloadStatus::Overloaded
        } else if percent < 60.0 {
            WorkloadStatus::Underutilized
        } else {
            WorkloadStatus::Optimal
        }
    }
}

/// One lead's load on one day of the final schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianWorkload {
    pub technician_id: String,
    pub job_count: u32,
    pub capacity: u32,
    pub utilization: f64,
    pub status: WorkloadStatus,
    pub travel_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub assignments: Vec<OptimizedAssignment>,
    pub technician_workloads: Vec<TechnicianWorkload>,
    pub total_travel_distance: f64,
    pub total_travel_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub total_travel_distance: f64,
    pub total_travel_time: f64,
    pub average_jobs_per_technician: f64,
    pub workload_variance: f64,
    pub utilization_rate: f64,
    pub geographic_efficiency: f64,
    pub deadline_compliance: f64,
    pub conflict_rate: f64,
    pub assigned_count: usize,
    pub unassigned_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub assignments: Vec<OptimizedAssignment>,
    pub unassigned_jobs: Vec<UnassignedJob>,
    pub rejected_input: Vec<RejectedJob>,
    pub optimization_metrics: OptimizationMetrics,
    pub conflicts: Vec<SchedulingConflict>,
    pub recommendations: Vec<String>,
    pub schedule_by_date: BTreeMap<NaiveDate, DailySchedule>,
}

impl SchedulingResult {
    pub fn unresolved_conflicts(&self) -> impl Iterator<Item = &SchedulingConflict> {
        self.conflicts.iter().filter(|c| !c.resolved)
    }

    pub fn assignment_for(&self, installation_id: &str) -> Option<&OptimizedAssignment> {
        self.assignments
            .iter()
            .find(|a| a.installation_id == installation_id)
    }

    pub fn is_unassigned(&self, installation_id: &str) -> bool {
        self.unassigned_jobs
            .iter()
            .any(|u| u.installation.id == installation_id)
    }
}
