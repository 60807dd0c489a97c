//! Interchangeable assignment heuristics, one per optimization goal.
//!
//! All of them are greedy: each job is decided once, in a strategy-specific
//! order, with no backtracking. Conflict resolution cleans up afterwards.

mod deadline;
mod hybrid;
mod satisfaction;
mod travel;
mod workload;

use std::collections::HashMap;

use chrono::NaiveDate;

pub use deadline::{DeadlinePriority, deadline_processing_order};
pub use hybrid::Hybrid;
pub use satisfaction::CustomerSatisfaction;
pub use travel::TravelDistance;
pub use workload::WorkloadBalance;

use crate::assignment::Placement;
use crate::context::PlanningContext;
use crate::models::{Installation, OptimizationGoal, TeamMember};
use crate::schedule::UnassignedReason;
use crate::traits::AssignmentStrategy;

/// Raw split produced by a strategy before conflict handling.
#[derive(Debug, Default)]
pub struct StrategyOutcome<'a> {
    pub placements: Vec<Placement<'a>>,
    pub unassigned: Vec<(&'a Installation, UnassignedReason)>,
}

impl<'a> StrategyOutcome<'a> {
    pub fn place(&mut self, job: &'a Installation, lead: &'a TeamMember, load: &mut LoadTracker) {
        load.add(lead, job);
        self.placements.push(Placement::new(job, lead));
    }

    pub fn reject(&mut self, job: &'a Installation, reason: UnassignedReason) {
        tracing::debug!(job = %job.id, ?reason, "job left unassigned");
        self.unassigned.push((job, reason));
    }
}

/// The strategy for a goal.
pub fn strategy_for(goal: OptimizationGoal) -> &'static dyn AssignmentStrategy {
    match goal {
        OptimizationGoal::TravelDistance => &TravelDistance,
        OptimizationGoal::WorkloadBalance => &WorkloadBalance,
        OptimizationGoal::DeadlinePriority => &DeadlinePriority,
        OptimizationGoal::CustomerSatisfaction => &CustomerSatisfaction,
        OptimizationGoal::Hybrid => &Hybrid,
    }
}

/// Running job counts per technician, per day and across the run.
#[derive(Debug, Default, Clone)]
pub struct LoadTracker {
    daily: HashMap<(String, NaiveDate), u32>,
    total: HashMap<String, u32>,
}

impl LoadTracker {
    pub fn add(&mut self, team: &TeamMember, job: &Installation) {
        if let Some(date) = job.scheduled_date {
            *self.daily.entry((team.id.clone(), date)).or_default() += 1;
        }
        *self.total.entry(team.id.clone()).or_default() += 1;
    }

    pub fn on(&self, team: &TeamMember, date: NaiveDate) -> u32 {
        self.daily.get(&(team.id.clone(), date)).copied().unwrap_or(0)
    }

    pub fn total(&self, team: &TeamMember) -> u32 {
        self.total.get(&team.id).copied().unwrap_or(0)
    }

    /// Whether one more job on the job's date stays within capacity.
    pub fn has_room(&self, team: &TeamMember, job: &Installation) -> bool {
        job.scheduled_date
            .is_some_and(|date| self.on(team, date) < team.capacity)
    }
}

/// Reason for a job no lead could take.
pub(crate) fn no_lead_reason(ctx: &PlanningContext<'_>, job: &Installation) -> UnassignedReason {
    if ctx.any_lead_can_handle(job) {
        UnassignedReason::CapacityExhausted
    } else {
        UnassignedReason::NoEligibleTechnician
    }
}

/// Leads that pass the shared eligibility rule for a job.
pub(crate) fn eligible_leads<'a>(ctx: &PlanningContext<'a>, job: &Installation) -> Vec<&'a TeamMember> {
    ctx.leads
        .iter()
        .copied()
        .filter(|lead| ctx.can_team_handle_job(lead, job))
        .collect()
}

/// Proximity on a 0–1 scale: 1 at the job, 0 at `band_miles` and beyond.
pub(crate) fn proximity(distance_miles: f64, band_miles: f64) -> f64 {
    if band_miles <= 0.0 {
        return 0.0;
    }
    (1.0 - distance_miles / band_miles).max(0.0)
}

/// Highest-scoring candidate; earlier candidates win ties.
pub(crate) fn best_by_score<'a, F>(candidates: &[&'a TeamMember], mut score: F) -> Option<&'a TeamMember>
where
    F: FnMut(&TeamMember) -> f64,
{
    let mut best: Option<(&'a TeamMember, f64)> = None;
    for &candidate in candidates {
        let value = score(candidate);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((candidate, value));
        }
    }
    best.map(|(member, _)| member)
}
