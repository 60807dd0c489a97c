//! Per-day workload balancing across field technicians.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Installation, Role, TeamMember};
use crate::schedule::WorkloadStatus;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One technician's share of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadAssignment {
    pub team_member_id: String,
    pub date: NaiveDate,
    pub installation_ids: Vec<String>,
    pub total_minutes: u32,
    pub capacity: u32,
    /// Jobs against capacity, as a percentage.
    pub utilization: f64,
    pub status: WorkloadStatus,
}

/// Spread jobs over field technicians day by day.
///
/// Each day's jobs go, highest priority first, to the available technician
/// with the lightest load among those under capacity. When everyone is full
/// the lightest technician still takes the job and the day reports
/// `Critical`. Jobs nobody can do (unavailable, missing specialization) are
/// skipped. Technicians available on a day with work but given none still
/// appear, as `Underutilized`.
pub fn balance_team_workload(
    team_members: &[TeamMember],
    installations: &[Installation],
    region: Option<&str>,
    date_range: Option<DateRange>,
) -> Vec<WorkloadAssignment> {
    let technicians: Vec<&TeamMember> = team_members
        .iter()
        .filter(|m| m.is_active && matches!(m.role, Role::Lead | Role::Assistant))
        .filter(|m| region.is_none_or(|r| m.serves_region(r)))
        .collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<&Installation>> = BTreeMap::new();
    for job in installations {
        let Some(date) = job.scheduled_date else {
            continue;
        };
        if date_range.is_some_and(|range| !range.contains(date)) {
            continue;
        }
        if let Some(r) = region {
            if !job.region.as_deref().is_some_and(|jr| jr.eq_ignore_ascii_case(r)) {
                continue;
            }
        }
        by_date.entry(date).or_default().push(job);
    }

    let mut result = Vec::new();

    for (date, mut jobs) in by_date {
        jobs.sort_by(|a, b| {
            b.priority
                .weight()
                .cmp(&a.priority.weight())
                .then_with(|| a.id.cmp(&b.id))
        });

        let available: Vec<&TeamMember> = technicians
            .iter()
            .copied()
            .filter(|m| m.is_available_on(date))
            .collect();
        let mut loads: Vec<Vec<&Installation>> = vec![Vec::new(); available.len()];

        for job in jobs {
            let capable: Vec<usize> = (0..available.len())
                .filter(|&i| available[i].matches_any_specialization(&job.required_specializations))
                .collect();

            let under_capacity = capable
                .iter()
                .copied()
                .filter(|&i| (loads[i].len() as u32) < available[i].capacity)
                .min_by_key(|&i| loads[i].len());
            let chosen = under_capacity.or_else(|| capable.iter().copied().min_by_key(|&i| loads[i].len()));

            match chosen {
                Some(i) => loads[i].push(job),
                None => tracing::warn!(job = %job.id, %date, "no technician can take job"),
            }
        }

        for (member, jobs) in available.iter().zip(loads) {
            let utilization = jobs.len() as f64 / f64::from(member.capacity.max(1)) * 100.0;
            result.push(WorkloadAssignment {
                team_member_id: member.id.clone(),
                date,
                total_minutes: jobs.iter().fold(0u32, |total, j| total.saturating_add(j.duration_minutes)),
                installation_ids: jobs.iter().map(|j| j.id.clone()).collect(),
                capacity: member.capacity,
                utilization,
                status: WorkloadStatus::from_utilization(utilization),
            });
        }
    }

    result
}
