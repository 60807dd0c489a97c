//! Conflict detection and best-effort resolution.
//!
//! Detection looks at each lead's day in start order for double bookings,
//! capacity overruns, days that run past midnight and legs that cannot be
//! driven in the gap between two jobs. Resolution walks conflicts from most to least severe, moving the
//! lower-priority job to another lead with room or dropping it. One pass is
//! not guaranteed to clear everything; callers re-detect afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::assignment::{END_OF_DAY, MINUTES_PER_DAY, Placement, assemble_assignments, minutes_from_time};
use crate::context::PlanningContext;
use crate::haversine::calculate_distance;
use crate::models::{Installation, OptimizationGoal, TeamMember};
use crate::schedule::{
    ConflictKind, ConflictSeverity, OptimizedAssignment, SchedulingConflict, UnassignedReason,
};

/// Shortfall under which a travel conflict is only `Low` severity.
const MINOR_TRAVEL_SHORTFALL_MINUTES: f64 = 15.0;

/// Scan assignments for conflicts. `teams` supplies capacities; leads not in
/// it are only checked for overlaps and travel.
pub fn detect_conflicts(
    assignments: &[OptimizedAssignment],
    teams: &[&TeamMember],
    travel_slack_minutes: f64,
) -> Vec<SchedulingConflict> {
    let capacity: HashMap<&str, u32> = teams.iter().map(|t| (t.id.as_str(), t.capacity)).collect();

    let mut days: BTreeMap<(&str, NaiveDate), Vec<&OptimizedAssignment>> = BTreeMap::new();
    for assignment in assignments {
        days.entry((assignment.lead_id.as_str(), assignment.scheduled_date))
            .or_default()
            .push(assignment);
    }

    let mut conflicts = Vec::new();

    for ((lead_id, date), mut day) in days {
        day.sort_by_key(|a| (a.start_time, a.end_time));

        if let Some(&cap) = capacity.get(lead_id) {
            if day.len() as u32 > cap {
                let severity = if day.len() as f64 > f64::from(cap) * 1.5 {
                    ConflictSeverity::Critical
                } else {
                    ConflictSeverity::High
                };
                conflicts.push(new_conflict(
                    ConflictKind::CapacityExceeded,
                    severity,
                    lead_id,
                    date,
                    &day,
                    format!("{} has {} jobs on {} against a capacity of {}", lead_id, day.len(), date, cap),
                ));
            }
        }

        let overrun: Vec<&OptimizedAssignment> = day.iter().copied().filter(|a| a.end_time == END_OF_DAY).collect();
        if !overrun.is_empty() {
            conflicts.push(new_conflict(
                ConflictKind::WorkdayOverrun,
                ConflictSeverity::High,
                lead_id,
                date,
                &overrun,
                format!(
                    "{}'s day on {} runs past midnight; {} job(s) do not fit",
                    lead_id,
                    date,
                    overrun.len()
                ),
            ));
        }

        let mut overlapping: HashSet<(usize, usize)> = HashSet::new();
        for i in 0..day.len() {
            for j in i + 1..day.len() {
                if day[j].start_time < day[i].end_time {
                    overlapping.insert((i, j));
                    conflicts.push(new_conflict(
                        ConflictKind::TimeOverlap,
                        ConflictSeverity::Critical,
                        lead_id,
                        date,
                        &[day[i], day[j]],
                        format!(
                            "{} is booked on {} and {} at the same time on {}",
                            lead_id, day[i].installation_id, day[j].installation_id, date
                        ),
                    ));
                }
            }
        }

        for i in 1..day.len() {
            let (prev, next) = (day[i - 1], day[i]);
            if overlapping.contains(&(i - 1, i)) || next.end_time == END_OF_DAY {
                continue;
            }
            if next.previous_job_id.as_deref() != Some(prev.installation_id.as_str()) {
                continue;
            }
            let gap = f64::from(minutes_from_time(next.start_time)) - f64::from(minutes_from_time(prev.end_time));
            let shortfall = next.estimated_travel_time - gap;
            if shortfall > travel_slack_minutes {
                let severity = if shortfall < MINOR_TRAVEL_SHORTFALL_MINUTES {
                    ConflictSeverity::Low
                } else {
                    ConflictSeverity::Medium
                };
                conflicts.push(new_conflict(
                    ConflictKind::TravelTimeInfeasible,
                    severity,
                    lead_id,
                    date,
                    &[prev, next],
                    format!(
                        "{} needs {:.0} minutes to drive from {} to {} but has {:.0}",
                        lead_id, next.estimated_travel_time, prev.installation_id, next.installation_id, gap
                    ),
                ));
            }
        }
    }

    for (i, conflict) in conflicts.iter_mut().enumerate() {
        conflict.id = format!("conflict-{}", i + 1);
    }
    conflicts
}

fn new_conflict(
    kind: ConflictKind,
    severity: ConflictSeverity,
    lead_id: &str,
    date: NaiveDate,
    involved: &[&OptimizedAssignment],
    description: String,
) -> SchedulingConflict {
    SchedulingConflict {
        id: String::new(),
        kind,
        severity,
        technician_id: lead_id.to_string(),
        date,
        assignment_ids: involved.iter().map(|a| a.id.clone()).collect(),
        installation_ids: involved.iter().map(|a| a.installation_id.clone()).collect(),
        description,
        resolved: false,
    }
}

/// Two detections describe the same problem when kind, lead, date and jobs agree.
pub fn same_conflict(a: &SchedulingConflict, b: &SchedulingConflict) -> bool {
    a.kind == b.kind
        && a.technician_id == b.technician_id
        && a.date == b.date
        && a.installation_ids == b.installation_ids
}

/// Revised assignments plus the jobs resolution had to drop.
#[derive(Debug, Clone)]
pub struct ConflictResolution<'a> {
    pub assignments: Vec<OptimizedAssignment>,
    pub demoted: Vec<(&'a Installation, UnassignedReason)>,
}

/// Working copy of who does what, kept in sync as jobs move.
struct Roster<'a> {
    owner: HashMap<&'a str, &'a TeamMember>,
    days: HashMap<(String, NaiveDate), Vec<&'a Installation>>,
    starts: HashMap<&'a str, u32>,
}

impl<'a> Roster<'a> {
    fn new(ctx: &PlanningContext<'a>, assignments: &[OptimizedAssignment]) -> Self {
        let mut roster = Roster {
            owner: HashMap::new(),
            days: HashMap::new(),
            starts: HashMap::new(),
        };
        for assignment in assignments {
            let (Some(job), Some(lead)) = (ctx.job(&assignment.installation_id), ctx.lead(&assignment.lead_id))
            else {
                continue;
            };
            roster
                .starts
                .insert(job.id.as_str(), minutes_from_time(assignment.start_time));
            roster.insert(job, lead);
        }
        roster
    }

    fn insert(&mut self, job: &'a Installation, lead: &'a TeamMember) {
        self.owner.insert(job.id.as_str(), lead);
        if let Some(date) = job.scheduled_date {
            self.days.entry((lead.id.clone(), date)).or_default().push(job);
        }
    }

    fn remove(&mut self, job: &'a Installation) {
        let Some(lead) = self.owner.remove(job.id.as_str()) else {
            return;
        };
        if let Some(date) = job.scheduled_date {
            if let Some(day) = self.days.get_mut(&(lead.id.clone(), date)) {
                day.retain(|j| j.id != job.id);
            }
        }
    }

    fn day(&self, lead: &TeamMember, date: NaiveDate) -> &[&'a Installation] {
        match self.days.get(&(lead.id.clone(), date)) {
            Some(day) => day.as_slice(),
            None => &[],
        }
    }

    /// Minutes of work already booked for `lead` on `date`.
    fn booked_minutes(&self, lead: &TeamMember, date: NaiveDate) -> u32 {
        self.day(lead, date)
            .iter()
            .fold(0u32, |total, job| total.saturating_add(job.duration_minutes))
    }

    fn is_with(&self, job: &Installation, lead: &TeamMember) -> bool {
        self.owner.get(job.id.as_str()).is_some_and(|owner| owner.id == lead.id)
    }

    fn start(&self, job: &Installation) -> u32 {
        self.starts.get(job.id.as_str()).copied().unwrap_or(0)
    }

    /// A fixed-time job cannot land on a day where it would overlap another
    /// fixed-time job. Flexible jobs are re-timed around fixed ones.
    fn clashes(&self, lead: &TeamMember, job: &Installation) -> bool {
        let (Some(date), Some(start)) = (job.scheduled_date, job.requested_start_minute()) else {
            return false;
        };
        let end = start.saturating_add(job.duration_minutes);
        self.day(lead, date).iter().any(|other| {
            other.requested_start_minute().is_some_and(|other_start| {
                other_start < end && start < other_start.saturating_add(other.duration_minutes)
            })
        })
    }

    fn placements(&self, ctx: &PlanningContext<'a>) -> Vec<Placement<'a>> {
        ctx.jobs
            .iter()
            .filter_map(|&job| self.owner.get(job.id.as_str()).map(|&lead| Placement::new(job, lead)))
            .collect()
    }
}

/// Resolve conflicts, most severe first and, within a severity, the one
/// touching the most important job first.
pub fn resolve_conflicts<'a>(
    assignments: &[OptimizedAssignment],
    conflicts: &[SchedulingConflict],
    ctx: &PlanningContext<'a>,
    strategy: OptimizationGoal,
) -> ConflictResolution<'a> {
    let mut roster = Roster::new(ctx, assignments);
    let mut demoted: Vec<(&'a Installation, UnassignedReason)> = Vec::new();
    let mut touched: HashSet<String> = HashSet::new();

    let top_priority = |conflict: &SchedulingConflict| {
        conflict
            .installation_ids
            .iter()
            .filter_map(|id| ctx.job(id))
            .map(|job| job.priority.weight())
            .max()
            .unwrap_or(0)
    };
    let mut ordered: Vec<&SchedulingConflict> = conflicts.iter().collect();
    ordered.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| top_priority(b).cmp(&top_priority(a)))
    });

    for conflict in ordered {
        let Some(lead) = ctx.lead(&conflict.technician_id) else {
            continue;
        };
        let victims = pick_victims(conflict, lead, &roster, &touched, ctx);

        for victim in victims {
            touched.insert(victim.id.clone());
            roster.remove(victim);

            match find_alternative(ctx, &roster, lead, victim, strategy) {
                Some(alternative) => {
                    tracing::debug!(
                        conflict = %conflict.id,
                        job = %victim.id,
                        from = %lead.id,
                        to = %alternative.id,
                        "reassigned job"
                    );
                    roster.insert(victim, alternative);
                }
                None => {
                    let reason = match conflict.kind {
                        ConflictKind::CapacityExceeded | ConflictKind::WorkdayOverrun => {
                            UnassignedReason::CapacityExhausted
                        }
                        ConflictKind::TimeOverlap | ConflictKind::TravelTimeInfeasible => {
                            UnassignedReason::ConflictUnresolved
                        }
                    };
                    tracing::debug!(conflict = %conflict.id, job = %victim.id, ?reason, "demoted job");
                    demoted.push((victim, reason));
                }
            }
        }
    }

    let placements = roster.placements(ctx);
    let assignments = assemble_assignments(ctx, &placements, strategy);
    ConflictResolution { assignments, demoted }
}

/// Jobs to move off `lead` for this conflict, lowest priority first and,
/// among equals, the later start.
fn pick_victims<'a>(
    conflict: &SchedulingConflict,
    lead: &TeamMember,
    roster: &Roster<'a>,
    touched: &HashSet<String>,
    ctx: &PlanningContext<'a>,
) -> Vec<&'a Installation> {
    let by_importance = |a: &&'a Installation, b: &&'a Installation| {
        a.priority
            .weight()
            .cmp(&b.priority.weight())
            .then_with(|| roster.start(b).cmp(&roster.start(a)))
    };

    match conflict.kind {
        ConflictKind::CapacityExceeded => {
            let mut day: Vec<&Installation> = roster.day(lead, conflict.date).to_vec();
            let excess = day.len().saturating_sub(lead.capacity as usize);
            day.sort_by(by_importance);
            day.into_iter().take(excess).collect()
        }
        // The jobs pushed past midnight are the ones that do not fit.
        ConflictKind::WorkdayOverrun => conflict
            .installation_ids
            .iter()
            .filter_map(|id| ctx.job(id))
            .filter(|job| !touched.contains(&job.id) && roster.is_with(job, lead))
            .collect(),
        ConflictKind::TimeOverlap | ConflictKind::TravelTimeInfeasible => {
            let involved: Vec<&Installation> = conflict
                .installation_ids
                .iter()
                .filter_map(|id| ctx.job(id))
                .collect();
            // Already handled by an earlier, more severe conflict.
            if involved.len() < 2
                || involved
                    .iter()
                    .any(|job| touched.contains(&job.id) || !roster.is_with(job, lead))
            {
                return Vec::new();
            }
            involved.into_iter().min_by(by_importance).into_iter().collect()
        }
    }
}

/// Least-loaded other lead that can take the job without breaking capacity,
/// running past midnight or clashing with a fixed appointment; nearest wins
/// ties. Under the travel-distance goal the job must also sit within the
/// lead's travel radius.
fn find_alternative<'a>(
    ctx: &PlanningContext<'a>,
    roster: &Roster<'a>,
    current: &TeamMember,
    job: &Installation,
    strategy: OptimizationGoal,
) -> Option<&'a TeamMember> {
    let date = job.scheduled_date?;
    let within_radius = |lead: &TeamMember| {
        strategy != OptimizationGoal::TravelDistance
            || (lead.coordinates.is_some()
                && job.is_geocoded()
                && calculate_distance(lead.base_location(), job.location()) <= lead.travel_radius_miles)
    };
    let fits_day = |lead: &TeamMember| {
        ctx.config
            .workday_start_minute
            .saturating_add(roster.booked_minutes(lead, date))
            .saturating_add(job.duration_minutes)
            <= MINUTES_PER_DAY
    };
    ctx.leads
        .iter()
        .copied()
        .filter(|lead| lead.id != current.id)
        .filter(|lead| ctx.can_team_handle_job(lead, job))
        .filter(|lead| within_radius(*lead))
        .filter(|lead| (roster.day(lead, date).len() as u32) < lead.capacity)
        .filter(|lead| fits_day(*lead))
        .filter(|lead| !roster.clashes(lead, job))
        .min_by(|a, b| {
            let load_a = roster.day(a, date).len();
            let load_b = roster.day(b, date).len();
            load_a.cmp(&load_b).then_with(|| {
                let da = calculate_distance(a.base_location(), job.location());
                let db = calculate_distance(b.base_location(), job.location());
                da.total_cmp(&db)
            })
        })
}
