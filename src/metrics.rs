//! Schedule quality metrics, per-day rollups and recommendations.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total travel distance / time | Sum of per-assignment legs |
//! | Average jobs per technician | Assigned jobs / eligible leads |
//! | Workload variance | Population variance of per-lead job counts |
//! | Utilization rate | Assigned jobs / capacity-days on job dates (0–1) |
//! | Geographic efficiency | 1 − mean leg miles / 50, clamped to 0–1 |
//! | Deadline compliance | Share of deadline jobs scheduled on or before it |
//! | Conflict rate | Unresolved conflicts / assignments |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::config::RecommendationThresholds;
use crate::models::{Installation, SchedulingRequest, TeamMember};
use crate::schedule::{
    DailySchedule, OptimizationMetrics, OptimizedAssignment, TechnicianWorkload, WorkloadStatus,
};

/// Mean leg length at which geographic efficiency reaches zero.
const REFERENCE_LEG_MILES: f64 = 50.0;

pub fn compute_metrics(
    assignments: &[OptimizedAssignment],
    unassigned_count: usize,
    jobs: &[&Installation],
    leads: &[&TeamMember],
    request: &SchedulingRequest,
    unresolved_conflicts: usize,
) -> OptimizationMetrics {
    let total_travel_distance: f64 = assignments.iter().map(|a| a.estimated_travel_distance).sum();
    let total_travel_time: f64 = assignments.iter().map(|a| a.estimated_travel_time).sum();

    let mut per_lead: HashMap<&str, usize> = leads.iter().map(|l| (l.id.as_str(), 0)).collect();
    for assignment in assignments {
        if let Some(count) = per_lead.get_mut(assignment.lead_id.as_str()) {
            *count += 1;
        }
    }

    let (average_jobs_per_technician, workload_variance) = if leads.is_empty() {
        (0.0, 0.0)
    } else {
        let n = leads.len() as f64;
        let mean = assignments.len() as f64 / n;
        let variance = per_lead
            .values()
            .map(|&count| (count as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, variance)
    };

    let job_dates: BTreeSet<NaiveDate> = jobs.iter().filter_map(|job| job.scheduled_date).collect();
    let capacity_days: u64 = leads
        .iter()
        .map(|lead| {
            job_dates
                .iter()
                .filter(|date| lead.is_available_on(**date))
                .map(|_| u64::from(lead.capacity))
                .sum::<u64>()
        })
        .sum();
    let utilization_rate = if capacity_days == 0 {
        0.0
    } else {
        assignments.len() as f64 / capacity_days as f64
    };

    let geographic_efficiency = if assignments.is_empty() {
        1.0
    } else {
        let mean_leg = total_travel_distance / assignments.len() as f64;
        (1.0 - mean_leg / REFERENCE_LEG_MILES).clamp(0.0, 1.0)
    };

    let mut with_deadline = 0usize;
    let mut on_time = 0usize;
    for assignment in assignments {
        if let Some(deadline) = request.deadline(&assignment.installation_id) {
            with_deadline += 1;
            if assignment.scheduled_date <= deadline {
                on_time += 1;
            }
        }
    }
    let deadline_compliance = if with_deadline == 0 {
        1.0
    } else {
        on_time as f64 / with_deadline as f64
    };

    let conflict_rate = unresolved_conflicts as f64 / assignments.len().max(1) as f64;

    OptimizationMetrics {
        total_travel_distance,
        total_travel_time,
        average_jobs_per_technician,
        workload_variance,
        utilization_rate,
        geographic_efficiency,
        deadline_compliance,
        conflict_rate,
        assigned_count: assignments.len(),
        unassigned_count,
    }
}

/// Group assignments by date with a workload line per lead working that day.
pub fn group_by_date(
    assignments: &[OptimizedAssignment],
    leads: &[&TeamMember],
) -> BTreeMap<NaiveDate, DailySchedule> {
    let capacity: HashMap<&str, u32> = leads.iter().map(|l| (l.id.as_str(), l.capacity)).collect();
    let mut schedules: BTreeMap<NaiveDate, DailySchedule> = BTreeMap::new();

    for assignment in assignments {
        let day = schedules
            .entry(assignment.scheduled_date)
            .or_insert_with(|| DailySchedule {
                date: assignment.scheduled_date,
                assignments: Vec::new(),
                technician_workloads: Vec::new(),
                total_travel_distance: 0.0,
                total_travel_time: 0.0,
            });
        day.total_travel_distance += assignment.estimated_travel_distance;
        day.total_travel_time += assignment.estimated_travel_time;
        day.assignments.push(assignment.clone());
    }

    for day in schedules.values_mut() {
        let mut per_lead: BTreeMap<&str, (u32, f64)> = BTreeMap::new();
        for assignment in &day.assignments {
            let entry = per_lead.entry(assignment.lead_id.as_str()).or_default();
            entry.0 += 1;
            entry.1 += assignment.estimated_travel_distance;
        }

        day.technician_workloads = per_lead
            .into_iter()
            .map(|(lead_id, (job_count, travel_distance))| {
                let cap = capacity.get(lead_id).copied().unwrap_or(0);
                let utilization = f64::from(job_count) / f64::from(cap.max(1)) * 100.0;
                TechnicianWorkload {
                    technician_id: lead_id.to_string(),
                    job_count,
                    capacity: cap,
                    utilization,
                    status: WorkloadStatus::from_utilization(utilization),
                    travel_distance,
                }
            })
            .collect();
    }

    schedules
}

/// Plain-language suggestions for the dispatcher.
pub fn generate_recommendations(
    metrics: &OptimizationMetrics,
    unresolved_conflicts: usize,
    resolved_conflicts: usize,
    rejected_inputs: usize,
    thresholds: &RecommendationThresholds,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if rejected_inputs > 0 {
        recommendations.push(format!(
            "{} job(s) were skipped for an incomplete address or missing date; correct them and re-run.",
            rejected_inputs
        ));
    }
    if metrics.unassigned_count > 0 {
        recommendations.push(format!(
            "{} job(s) could not be assigned; consider adding technicians with the required specializations or extending availability.",
            metrics.unassigned_count
        ));
    }
    if resolved_conflicts > 0 {
        recommendations.push(format!(
            "{} scheduling conflict(s) were resolved by reassigning or deferring jobs; review the changes before confirming.",
            resolved_conflicts
        ));
    }
    if unresolved_conflicts > 0 {
        recommendations.push(format!(
            "{} scheduling conflict(s) remain; review overlapping appointments and travel between consecutive jobs.",
            unresolved_conflicts
        ));
    }
    if metrics.workload_variance > thresholds.workload_variance {
        recommendations.push(format!(
            "Workload is uneven across technicians (variance {:.2}); consider the workload balance goal.",
            metrics.workload_variance
        ));
    }
    if metrics.assigned_count > 0 && metrics.utilization_rate < thresholds.low_utilization {
        recommendations.push(format!(
            "Team utilization is {:.0}%; there is capacity for additional installations.",
            metrics.utilization_rate * 100.0
        ));
    }
    if metrics.utilization_rate > thresholds.high_utilization {
        recommendations.push(format!(
            "Team utilization is {:.0}%; the team is near capacity, consider adding technicians or spreading jobs over more days.",
            metrics.utilization_rate * 100.0
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Schedule looks healthy; no changes recommended.".to_string());
    }

    recommendations
}
