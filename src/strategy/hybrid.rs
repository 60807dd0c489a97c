//! Hybrid strategy (default).

use crate::context::PlanningContext;
use crate::haversine::calculate_distance;
use crate::models::{Installation, TeamMember};
use crate::schedule::UnassignedReason;
use crate::traits::AssignmentStrategy;

use super::{LoadTracker, StrategyOutcome, best_by_score, eligible_leads, proximity};

/// Jobs-per-day count at which the load term bottoms out.
const LOAD_SATURATION: f64 = 10.0;

/// Equal-weight blend per job: proximity within the lead's travel radius,
/// remaining headroom (1 − day load / 10, floored at 0), specialization
/// match ratio, and mean field score as a fraction. No lookahead.
pub struct Hybrid;

impl Hybrid {
    pub(crate) fn score(
        ctx: &PlanningContext<'_>,
        load: &LoadTracker,
        lead: &TeamMember,
        job: &Installation,
    ) -> f64 {
        let distance = calculate_distance(lead.base_location(), job.location());
        let current = job
            .scheduled_date
            .map_or(0, |date| load.on(lead, date));
        let headroom = (1.0 - f64::from(current) / LOAD_SATURATION).max(0.0);

        0.25 * proximity(distance, lead.travel_radius_miles)
            + 0.25 * headroom
            + 0.25 * lead.specialization_match_ratio(ctx.required_specializations(job))
            + 0.25 * lead.performance.mean_score_fraction()
    }
}

impl AssignmentStrategy for Hybrid {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a> {
        let mut outcome = StrategyOutcome::default();
        let mut load = LoadTracker::default();

        for &job in &ctx.jobs {
            let candidates = eligible_leads(ctx, job);
            match best_by_score(&candidates, |lead| Self::score(ctx, &load, lead, job)) {
                Some(lead) => outcome.place(job, lead, &mut load),
                None => outcome.reject(job, UnassignedReason::NoEligibleTechnician),
            }
        }

        outcome
    }
}
