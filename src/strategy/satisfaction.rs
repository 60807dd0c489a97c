//! Customer-satisfaction strategy.

use crate::context::PlanningContext;
use crate::haversine::calculate_distance;
use crate::models::{Installation, TeamMember};
use crate::schedule::UnassignedReason;
use crate::traits::AssignmentStrategy;

use super::{LoadTracker, StrategyOutcome, best_by_score, eligible_leads, proximity};

const SATISFACTION_WEIGHT: f64 = 0.4;
const COMPLETION_WEIGHT: f64 = 0.3;
const SPECIALIZATION_WEIGHT: f64 = 0.2;
const PROXIMITY_WEIGHT: f64 = 0.1;

/// Best-rated eligible lead per job, decided independently per job.
///
/// Score = 0.4·customer satisfaction (0–5) + 0.3·completion rate (0–1)
/// + 0.2·specialization match ratio + 0.1·proximity bonus. Metrics are used
/// on their native scales.
pub struct CustomerSatisfaction;

impl CustomerSatisfaction {
    pub(crate) fn score(ctx: &PlanningContext<'_>, lead: &TeamMember, job: &Installation) -> f64 {
        let distance = calculate_distance(lead.base_location(), job.location());
        let bonus = proximity(distance, ctx.config.satisfaction_proximity_miles);

        SATISFACTION_WEIGHT * lead.performance.customer_satisfaction
            + COMPLETION_WEIGHT * lead.performance.completion_rate
            + SPECIALIZATION_WEIGHT * lead.specialization_match_ratio(ctx.required_specializations(job))
            + PROXIMITY_WEIGHT * bonus
    }
}

impl AssignmentStrategy for CustomerSatisfaction {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a> {
        let mut outcome = StrategyOutcome::default();
        let mut load = LoadTracker::default();

        for &job in &ctx.jobs {
            let candidates = eligible_leads(ctx, job);
            match best_by_score(&candidates, |lead| Self::score(ctx, lead, job)) {
                Some(lead) => outcome.place(job, lead, &mut load),
                None => outcome.reject(job, UnassignedReason::NoEligibleTechnician),
            }
        }

        outcome
    }
}
