//! Turns (job, lead) placements into timed `OptimizedAssignment` records.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::context::PlanningContext;
use crate::models::{Installation, OptimizationGoal, TeamMember};
use crate::route::build_timeline;
use crate::schedule::{AssignmentStatus, OptimizedAssignment};

/// A job handed to a lead by a strategy or by conflict resolution.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub job: &'a Installation,
    pub lead: &'a TeamMember,
}

impl<'a> Placement<'a> {
    pub fn new(job: &'a Installation, lead: &'a TeamMember) -> Self {
        Self { job, lead }
    }
}

/// Build each lead's daily timeline and emit one assignment per stop,
/// ordered by date, lead, then start time.
pub fn assemble_assignments(
    ctx: &PlanningContext<'_>,
    placements: &[Placement<'_>],
    strategy: OptimizationGoal,
) -> Vec<OptimizedAssignment> {
    let mut days: BTreeMap<(NaiveDate, &str), (&TeamMember, Vec<&Installation>)> = BTreeMap::new();
    for placement in placements {
        let Some(date) = placement.job.scheduled_date else {
            continue;
        };
        days.entry((date, placement.lead.id.as_str()))
            .or_insert_with(|| (placement.lead, Vec::new()))
            .1
            .push(placement.job);
    }

    let travel = ctx.travel();
    let mut assignments = Vec::with_capacity(placements.len());

    for ((date, _), (lead, jobs)) in days {
        let stops = build_timeline(
            lead,
            &jobs,
            &travel,
            ctx.config.workday_start_minute,
            ctx.config.buffer_minutes,
            ctx.config.route_improvement_iterations,
        );
        let workload_score = stops.len() as f64 / f64::from(lead.capacity.max(1));

        for (i, stop) in stops.iter().enumerate() {
            let efficiency_score = if lead.travel_radius_miles > 0.0 {
                (1.0 - stop.leg.distance_miles / lead.travel_radius_miles).clamp(0.0, 1.0)
            } else {
                0.0
            };

            assignments.push(OptimizedAssignment {
                id: format!("assignment-{}", stop.job.id),
                installation_id: stop.job.id.clone(),
                lead_id: lead.id.clone(),
                assistant_id: None,
                scheduled_date: date,
                start_time: time_from_minutes(stop.start_minute),
                end_time: time_from_minutes(stop.end_minute),
                estimated_travel_time: stop.leg.duration_minutes,
                estimated_travel_distance: stop.leg.distance_miles,
                buffer_time: ctx.config.buffer_minutes,
                workload_score,
                efficiency_score,
                previous_job_id: i.checked_sub(1).map(|p| stops[p].job.id.clone()),
                next_job_id: stops.get(i + 1).map(|n| n.job.id.clone()),
                status: AssignmentStatus::Assigned,
                strategy,
            });
        }
    }

    assignments
}

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Marker for times that fall at or past midnight. Regular times are whole
/// minutes, so the trailing second never collides with one.
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Minutes after midnight as a wall-clock time. Anything at or past midnight
/// becomes `END_OF_DAY`, which conflict detection reports as a workday
/// overrun.
pub fn time_from_minutes(minutes: u32) -> NaiveTime {
    if minutes >= MINUTES_PER_DAY {
        return END_OF_DAY;
    }
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(END_OF_DAY)
}

/// Inverse of `time_from_minutes`.
pub fn minutes_from_time(time: NaiveTime) -> u32 {
    crate::models::minute_of_day(time)
}
