//! Route ordering and daily timelines.
//!
//! `optimize_route` is a nearest-neighbour construction followed by bounded
//! 2-opt passes. The result is approximately optimal, not globally optimal.

use serde::{Deserialize, Serialize};

use crate::distance::TravelEstimator;
use crate::models::{Installation, TeamMember};
use crate::traits::TravelLeg;

/// A stop on an ordered route with the leg that reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub installation_id: String,
    pub travel_distance: f64,
    pub travel_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub stops: Vec<RouteStop>,
    pub total_distance: f64,
    pub total_time: f64,
}

/// Order jobs into a route starting from the technician's base.
pub fn optimize_route(
    jobs: &[&Installation],
    team: &TeamMember,
    travel: &TravelEstimator<'_>,
    improvement_iterations: usize,
) -> RoutePlan {
    let order = order_jobs(jobs, team, travel, improvement_iterations);

    let mut plan = RoutePlan::default();
    let mut previous: Option<&Installation> = None;
    for job in order {
        let leg = travel.leg(team, previous, job);
        plan.total_distance += leg.distance_miles;
        plan.total_time += leg.duration_minutes;
        plan.stops.push(RouteStop {
            installation_id: job.id.clone(),
            travel_distance: leg.distance_miles,
            travel_time: leg.duration_minutes,
        });
        previous = Some(job);
    }
    plan
}

/// Nearest-neighbour order from base, then 2-opt until no improving
/// reversal remains or the iteration budget runs out.
pub(crate) fn order_jobs<'j>(
    jobs: &[&'j Installation],
    team: &TeamMember,
    travel: &TravelEstimator<'_>,
    improvement_iterations: usize,
) -> Vec<&'j Installation> {
    let mut remaining: Vec<&Installation> = jobs.to_vec();
    let mut order = Vec::with_capacity(remaining.len());
    let mut previous: Option<&Installation> = None;

    while !remaining.is_empty() {
        let (next_idx, _) = remaining
            .iter()
            .enumerate()
            .map(|(i, job)| (i, travel.leg(team, previous, job).distance_miles))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        let next = remaining.remove(next_idx);
        order.push(next);
        previous = Some(next);
    }

    for _ in 0..improvement_iterations {
        if !two_opt_improve(&mut order, team, travel) {
            break;
        }
    }

    order
}

fn path_distance(order: &[&Installation], team: &TeamMember, travel: &TravelEstimator<'_>) -> f64 {
    let mut total = 0.0;
    let mut previous: Option<&Installation> = None;
    for job in order {
        total += travel.leg(team, previous, job).distance_miles;
        previous = Some(job);
    }
    total
}

/// 2-opt: reverse a segment of the route to reduce travel distance.
/// Returns true if an improvement was made.
fn two_opt_improve(order: &mut [&Installation], team: &TeamMember, travel: &TravelEstimator<'_>) -> bool {
    if order.len() < 2 {
        return false;
    }

    let current = path_distance(order, team, travel);
    let n = order.len();

    for i in 0..n - 1 {
        for j in i + 1..n {
            let mut candidate = order.to_vec();
            candidate[i..=j].reverse();

            // Only accept strict improvements beyond float noise.
            if path_distance(&candidate, team, travel) + 1e-9 < current {
                order[i..=j].reverse();
                return true;
            }
        }
    }

    false
}

/// A job placed on a technician's day.
#[derive(Debug, Clone)]
pub struct TimedStop<'j> {
    pub job: &'j Installation,
    pub start_minute: u32,
    pub end_minute: u32,
    pub leg: TravelLeg,
}

/// Lay out one technician's day.
///
/// Fixed-time jobs keep their requested start. Flexible jobs follow the
/// optimized route order and are packed ahead of the next fixed job only when
/// they, their buffer, and the drive to that fixed job fit before it starts.
/// Overlaps between fixed jobs are left in place for conflict detection.
pub fn build_timeline<'j>(
    team: &TeamMember,
    jobs: &[&'j Installation],
    travel: &TravelEstimator<'_>,
    workday_start_minute: u32,
    buffer_minutes: u32,
    improvement_iterations: usize,
) -> Vec<TimedStop<'j>> {
    let (mut fixed, flexible): (Vec<&Installation>, Vec<&Installation>) = jobs
        .iter()
        .copied()
        .partition(|job| job.requested_start_minute().is_some());
    fixed.sort_by(|a, b| {
        a.requested_start_minute()
            .cmp(&b.requested_start_minute())
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut fixed = fixed.into_iter().peekable();
    let mut flexible = order_jobs(&flexible, team, travel, improvement_iterations)
        .into_iter()
        .peekable();

    let mut stops = Vec::with_capacity(jobs.len());
    let mut cursor = f64::from(workday_start_minute);
    let mut previous: Option<&Installation> = None;

    loop {
        let take_flexible = match (flexible.peek(), fixed.peek()) {
            (None, None) => break,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(flex), Some(anchor)) => {
                let arrival = cursor + travel.leg(team, previous, flex).duration_minutes;
                let finish = arrival.ceil() + f64::from(flex.duration_minutes);
                let onward = travel.between_jobs(flex, anchor).duration_minutes;
                let anchor_start = f64::from(anchor.requested_start_minute().unwrap_or(0));
                finish + f64::from(buffer_minutes) + onward <= anchor_start
            }
        };

        let (job, start_minute) = if take_flexible {
            let Some(job) = flexible.next() else { break };
            let arrival = cursor + travel.leg(team, previous, job).duration_minutes;
            (job, arrival.ceil() as u32)
        } else {
            let Some(job) = fixed.next() else { break };
            (job, job.requested_start_minute().unwrap_or(workday_start_minute))
        };

        let leg = travel.leg(team, previous, job);
        let end_minute = start_minute.saturating_add(job.duration_minutes);
        cursor = cursor.max(f64::from(end_minute.saturating_add(buffer_minutes)));
        stops.push(TimedStop {
            job,
            start_minute,
            end_minute,
            leg,
        });
        previous = Some(job);
    }

    stops
}
