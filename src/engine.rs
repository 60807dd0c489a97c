//! Scheduling engine: validates a request, runs the chosen strategy, then
//! detects and resolves conflicts and reports on the result.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::assignment::{MINUTES_PER_DAY, assemble_assignments};
use crate::config::EngineConfig;
use crate::conflict::{detect_conflicts, resolve_conflicts, same_conflict};
use crate::context::PlanningContext;
use crate::error::EngineError;
use crate::haversine::HaversineMatrix;
use crate::metrics::{compute_metrics, generate_recommendations, group_by_date};
use crate::models::{Installation, SchedulingRequest, TeamMember};
use crate::pairing::find_optimal_pairings;
use crate::schedule::{
    OptimizedAssignment, RejectedJob, RejectionReason, SchedulingConflict, SchedulingResult,
    UnassignedJob,
};
use crate::strategy::strategy_for;
use crate::traits::DistanceMatrixProvider;

/// Stateless between runs: every call to `optimize_schedule` builds its own
/// planning context, so one engine can serve many requests.
pub struct SchedulingEngine<M = HaversineMatrix> {
    config: EngineConfig,
    provider: M,
}

impl SchedulingEngine<HaversineMatrix> {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let provider = HaversineMatrix::new(config.average_speed_mph);
        Self::with_provider(config, provider)
    }
}

impl Default for SchedulingEngine<HaversineMatrix> {
    fn default() -> Self {
        let config = EngineConfig::default();
        let provider = HaversineMatrix::new(config.average_speed_mph);
        Self { config, provider }
    }
}

impl<M: DistanceMatrixProvider> SchedulingEngine<M> {
    /// Use a custom travel provider, e.g. `OsrmClient` for road distances.
    pub fn with_provider(config: EngineConfig, provider: M) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config, provider })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assign the request's jobs to its technicians.
    ///
    /// Errors only on malformed input (duplicate ids, inverted availability
    /// windows). Jobs that cannot be placed are reported in the result, and
    /// every input job ends up in exactly one of `assignments`,
    /// `unassigned_jobs` or `rejected_input`.
    pub fn optimize_schedule(&self, request: &SchedulingRequest) -> Result<SchedulingResult, EngineError> {
        validate_request(request)?;

        let goal = request.preferences.optimization_goal;
        let (jobs, rejected_input) = validate_jobs(&request.jobs);
        warn_unknown_constraints(request);

        let ctx = PlanningContext::build(request, &self.config, jobs, &self.provider);
        info!(
            jobs = ctx.jobs.len(),
            rejected = rejected_input.len(),
            leads = ctx.leads.len(),
            assistants = ctx.assistants.len(),
            clusters = ctx.clusters.clusters.len(),
            ?goal,
            "optimizing schedule"
        );

        let outcome = strategy_for(goal).assign(&ctx);
        let initial = assemble_assignments(&ctx, &outcome.placements, goal);

        let initial_conflicts = detect_conflicts(&initial, &ctx.leads, self.config.travel_slack_minutes);
        let resolution = resolve_conflicts(&initial, &initial_conflicts, &ctx, goal);
        let mut assignments = resolution.assignments;

        if self.config.assign_assistants {
            attach_assistants(&ctx, &mut assignments);
        }

        let remaining = detect_conflicts(&assignments, &ctx.leads, self.config.travel_slack_minutes);
        let conflicts = reconcile_conflicts(initial_conflicts, remaining);
        let unresolved = conflicts.iter().filter(|c| !c.resolved).count();
        let resolved = conflicts.len() - unresolved;

        let unassigned_jobs: Vec<UnassignedJob> = outcome
            .unassigned
            .iter()
            .chain(resolution.demoted.iter())
            .map(|&(job, reason)| UnassignedJob {
                installation: job.clone(),
                reason,
            })
            .collect();

        let optimization_metrics = compute_metrics(
            &assignments,
            unassigned_jobs.len(),
            &ctx.jobs,
            &ctx.leads,
            request,
            unresolved,
        );
        let schedule_by_date = group_by_date(&assignments, &ctx.leads);
        let recommendations = generate_recommendations(
            &optimization_metrics,
            unresolved,
            resolved,
            rejected_input.len(),
            &self.config.recommendations,
        );

        info!(
            assigned = assignments.len(),
            unassigned = unassigned_jobs.len(),
            conflicts_resolved = resolved,
            conflicts_unresolved = unresolved,
            total_miles = optimization_metrics.total_travel_distance,
            "schedule optimized"
        );

        Ok(SchedulingResult {
            assignments,
            unassigned_jobs,
            rejected_input,
            optimization_metrics,
            conflicts,
            recommendations,
            schedule_by_date,
        })
    }
}

fn validate_request(request: &SchedulingRequest) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for job in &request.jobs {
        if !seen.insert(job.id.as_str()) {
            return Err(EngineError::DuplicateInstallation(job.id.clone()));
        }
    }

    let mut seen = HashSet::new();
    for member in &request.teams {
        if !seen.insert(member.id.as_str()) {
            return Err(EngineError::DuplicateTeamMember(member.id.clone()));
        }
        validate_availability(member)?;
    }
    Ok(())
}

fn validate_availability(member: &TeamMember) -> Result<(), EngineError> {
    for window in &member.availability {
        if window.end_date < window.start_date {
            return Err(EngineError::InvalidAvailabilityDates {
                member: member.id.clone(),
                start: window.start_date,
                end: window.end_date,
            });
        }
        if let (Some(start), Some(end)) = (window.start_time, window.end_time) {
            if end < start {
                return Err(EngineError::InvalidAvailabilityTimes {
                    member: member.id.clone(),
                    start: window.start_date,
                });
            }
        }
    }
    Ok(())
}

/// Split jobs into schedulable ones and rejects.
fn validate_jobs(jobs: &[Installation]) -> (Vec<&Installation>, Vec<RejectedJob>) {
    let mut valid = Vec::with_capacity(jobs.len());
    let mut rejected = Vec::new();

    for job in jobs {
        let reason = if !job.address.is_complete() {
            Some(RejectionReason::IncompleteAddress)
        } else if job.scheduled_date.is_none() {
            Some(RejectionReason::MissingScheduledDate)
        } else if job.duration_minutes == 0 || job.duration_minutes > MINUTES_PER_DAY {
            Some(RejectionReason::InvalidDuration)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                debug!(job = %job.id, ?reason, "rejected job input");
                rejected.push(RejectedJob {
                    installation: job.clone(),
                    reason,
                });
            }
            None => valid.push(job),
        }
    }

    (valid, rejected)
}

fn warn_unknown_constraints(request: &SchedulingRequest) {
    let known: HashSet<&str> = request.jobs.iter().map(|j| j.id.as_str()).collect();
    let constraints = &request.constraints;
    for id in constraints
        .deadlines
        .keys()
        .chain(constraints.required_specializations.keys())
    {
        if !known.contains(id.as_str()) {
            warn!(job = %id, "constraint refers to an unknown job");
        }
    }
}

/// Give each lead's assignments the paired assistant, on days the assistant
/// is available.
fn attach_assistants(ctx: &PlanningContext<'_>, assignments: &mut [OptimizedAssignment]) {
    if ctx.assistants.is_empty() {
        return;
    }
    let members: Vec<&TeamMember> = ctx.leads.iter().chain(ctx.assistants.iter()).copied().collect();
    let pairings = find_optimal_pairings(&members, None, ctx.config.pairing.min_compatibility);

    for pairing in &pairings {
        let Some(assistant) = ctx.assistants.iter().find(|a| a.id == pairing.assistant_id) else {
            continue;
        };
        debug!(
            lead = %pairing.lead_id,
            assistant = %assistant.id,
            score = pairing.compatibility_score,
            "paired assistant"
        );
        for assignment in assignments
            .iter_mut()
            .filter(|a| a.lead_id == pairing.lead_id)
            .filter(|a| assistant.is_available_on(a.scheduled_date))
        {
            assignment.assistant_id = Some(assistant.id.clone());
        }
    }
}

/// Mark initial conflicts resolved unless they survive, then append any new
/// ones the resolution introduced.
fn reconcile_conflicts(
    initial: Vec<SchedulingConflict>,
    remaining: Vec<SchedulingConflict>,
) -> Vec<SchedulingConflict> {
    let mut conflicts: Vec<SchedulingConflict> = initial
        .into_iter()
        .map(|mut conflict| {
            conflict.resolved = !remaining.iter().any(|r| same_conflict(&conflict, r));
            conflict
        })
        .collect();

    let introduced: Vec<SchedulingConflict> = remaining
        .into_iter()
        .filter(|r| !conflicts.iter().any(|c| same_conflict(c, r)))
        .collect();
    for mut conflict in introduced {
        conflict.id = format!("conflict-{}", conflicts.len() + 1);
        conflict.resolved = false;
        conflicts.push(conflict);
    }

    conflicts
}
