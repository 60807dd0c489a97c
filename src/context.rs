//! Per-run planning state: validated jobs, eligible technicians and the
//! derived geography. Built fresh for every optimization call and threaded
//! through the strategies, so engine instances hold no scratch state.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::cluster::{ClusterSet, create_geographic_clusters};
use crate::config::EngineConfig;
use crate::distance::{DistanceMatrix, TravelEstimator};
use crate::haversine::HaversineMatrix;
use crate::models::{Installation, Role, SchedulingRequest, TeamMember};
use crate::traits::DistanceMatrixProvider;

pub struct PlanningContext<'a> {
    pub request: &'a SchedulingRequest,
    pub config: &'a EngineConfig,
    /// Jobs that passed validation, in request order.
    pub jobs: Vec<&'a Installation>,
    /// Active leads with at least one availability window.
    pub leads: Vec<&'a TeamMember>,
    /// Active assistants with at least one availability window.
    pub assistants: Vec<&'a TeamMember>,
    pub matrix: DistanceMatrix,
    pub clusters: ClusterSet,
    pub straight_line: HaversineMatrix,
    jobs_by_id: HashMap<&'a str, &'a Installation>,
    required: HashMap<&'a str, Vec<String>>,
}

impl<'a> PlanningContext<'a> {
    pub fn build<M>(
        request: &'a SchedulingRequest,
        config: &'a EngineConfig,
        jobs: Vec<&'a Installation>,
        provider: &M,
    ) -> Self
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        let straight_line = HaversineMatrix::new(config.average_speed_mph);
        let (leads, assistants) = filter_teams(&request.teams);
        let matrix = DistanceMatrix::build(&jobs, provider, &straight_line);
        let clusters = create_geographic_clusters(&jobs, config.cluster_radius_miles);
        let jobs_by_id = jobs
            .iter()
            .map(|&job: &&'a Installation| (job.id.as_str(), job))
            .collect();
        let required = jobs
            .iter()
            .map(|&job: &&'a Installation| (job.id.as_str(), request.required_specializations(job)))
            .collect();

        Self {
            request,
            config,
            jobs,
            leads,
            assistants,
            matrix,
            clusters,
            straight_line,
            jobs_by_id,
            required,
        }
    }

    pub fn travel(&self) -> TravelEstimator<'_> {
        TravelEstimator::new(&self.matrix, &self.straight_line)
    }

    pub fn job(&self, id: &str) -> Option<&'a Installation> {
        self.jobs_by_id.get(id).copied()
    }

    pub fn lead(&self, id: &str) -> Option<&'a TeamMember> {
        self.leads.iter().find(|lead| lead.id == id).copied()
    }

    pub fn required_specializations(&self, job: &Installation) -> &[String] {
        match self.required.get(job.id.as_str()) {
            Some(required) => required.as_slice(),
            None => &[],
        }
    }

    pub fn deadline(&self, job: &Installation) -> Option<NaiveDate> {
        self.request.deadline(&job.id)
    }

    /// Shared eligibility rule: available on the job date, and holding at
    /// least one required specialization when any are declared.
    pub fn can_team_handle_job(&self, team: &TeamMember, job: &Installation) -> bool {
        let Some(date) = job.scheduled_date else {
            return false;
        };
        team.is_available_on(date) && team.matches_any_specialization(self.required_specializations(job))
    }

    pub fn any_lead_can_handle(&self, job: &Installation) -> bool {
        self.leads.iter().any(|lead| self.can_team_handle_job(lead, job))
    }
}

/// Keep active members that have declared availability, split by role.
/// Admin and scheduler accounts never receive field work.
fn filter_teams(teams: &[TeamMember]) -> (Vec<&TeamMember>, Vec<&TeamMember>) {
    let mut leads = Vec::new();
    let mut assistants = Vec::new();
    for member in teams {
        if !member.is_active || member.availability.is_empty() {
            continue;
        }
        match member.role {
            Role::Lead => leads.push(member),
            Role::Assistant => assistants.push(member),
            Role::Admin | Role::Scheduler => {}
        }
    }
    (leads, assistants)
}
