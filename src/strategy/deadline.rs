//! Deadline-priority strategy.

use std::cmp::Ordering;

use crate::context::PlanningContext;
use crate::models::{Installation, SchedulingRequest};
use crate::schedule::UnassignedReason;
use crate::traits::AssignmentStrategy;

use super::{LoadTracker, StrategyOutcome, eligible_leads};

/// Jobs with deadlines first, earliest deadline first; the rest by priority.
/// Ties keep request order.
pub fn deadline_processing_order<'a>(
    jobs: &[&'a Installation],
    request: &SchedulingRequest,
) -> Vec<&'a Installation> {
    let mut ordered = jobs.to_vec();
    ordered.sort_by(|a, b| {
        match (request.deadline(&a.id), request.deadline(&b.id)) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
    });
    ordered
}

/// Processes jobs in deadline order. A deadline job goes to the first
/// eligible lead that can still fit it on a day no later than the deadline,
/// falling back to the first eligible lead. Other jobs take the first
/// eligible lead with room, or the first eligible lead.
pub struct DeadlinePriority;

impl AssignmentStrategy for DeadlinePriority {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a> {
        let mut outcome = StrategyOutcome::default();
        let mut load = LoadTracker::default();

        for job in deadline_processing_order(&ctx.jobs, ctx.request) {
            let candidates = eligible_leads(ctx, job);
            let Some(&first) = candidates.first() else {
                outcome.reject(job, UnassignedReason::NoEligibleTechnician);
                continue;
            };

            let on_time = match (ctx.deadline(job), job.scheduled_date) {
                (Some(deadline), Some(date)) => date <= deadline,
                _ => true,
            };
            let preferred = if on_time {
                candidates.iter().copied().find(|lead| load.has_room(lead, job))
            } else {
                None
            };

            if !on_time {
                tracing::debug!(job = %job.id, "scheduled date falls after deadline");
            }

            outcome.place(job, preferred.unwrap_or(first), &mut load);
        }

        outcome
    }
}
