//! Travel-distance strategy: whole clusters go to nearby technicians.

use std::collections::BTreeSet;

use crate::context::PlanningContext;
use crate::haversine::calculate_distance;
use crate::models::{Installation, TeamMember};
use crate::schedule::UnassignedReason;
use crate::traits::AssignmentStrategy;

use super::{LoadTracker, StrategyOutcome};

/// Hands each geographic cluster to the lead with the best spare-capacity
/// to distance ratio among those whose travel radius reaches the centroid.
///
/// Travel radius is a hard filter here. Jobs the best lead cannot take fall
/// through to the next candidate; jobs nobody in range can take stay
/// unassigned. Ungeocoded jobs are never placed.
pub struct TravelDistance;

impl AssignmentStrategy for TravelDistance {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a> {
        let mut outcome = StrategyOutcome::default();
        let mut load = LoadTracker::default();

        for id in &ctx.clusters.ungeocoded {
            if let Some(job) = ctx.job(id) {
                outcome.reject(job, UnassignedReason::MissingCoordinates);
            }
        }

        for cluster in &ctx.clusters.clusters {
            let jobs: Vec<&Installation> = cluster.job_ids.iter().filter_map(|id| ctx.job(id)).collect();
            let dates: BTreeSet<_> = jobs.iter().filter_map(|job| job.scheduled_date).collect();

            let mut candidates: Vec<(&TeamMember, f64, f64)> = ctx
                .leads
                .iter()
                .filter_map(|&lead| {
                    let distance = calculate_distance(lead.base_location(), cluster.centroid);
                    if lead.coordinates.is_none() || distance > lead.travel_radius_miles {
                        return None;
                    }
                    let spare: u32 = dates
                        .iter()
                        .map(|date| lead.capacity.saturating_sub(load.on(lead, *date)))
                        .sum();
                    Some((lead, f64::from(spare) / distance.max(1.0), distance))
                })
                .collect();
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.total_cmp(&b.2)));

            tracing::debug!(
                cluster = %cluster.id,
                jobs = jobs.len(),
                candidates = candidates.len(),
                "assigning cluster"
            );

            for job in jobs {
                let in_range: Vec<&TeamMember> = candidates
                    .iter()
                    .map(|(lead, _, _)| *lead)
                    .filter(|lead| ctx.can_team_handle_job(lead, job))
                    .collect();
                let chosen = in_range.iter().copied().find(|lead| load.has_room(lead, job));

                match chosen {
                    Some(lead) => outcome.place(job, lead, &mut load),
                    None if !in_range.is_empty() => outcome.reject(job, UnassignedReason::CapacityExhausted),
                    None if ctx.any_lead_can_handle(job) => {
                        outcome.reject(job, UnassignedReason::OutsideTravelRadius)
                    }
                    None => outcome.reject(job, UnassignedReason::NoEligibleTechnician),
                }
            }
        }

        outcome
    }
}
