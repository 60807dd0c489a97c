//! Test fixtures for install-scheduler.
//!
//! Provides:
//! - Front Range (Colorado) locations
//! - Builders for jobs, technicians and requests with sensible defaults

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};

use install_scheduler::models::{
    Address, AvailabilityWindow, Coordinates, Installation, JobStatus, PerformanceMetrics, Priority,
    Recurrence, Role, SchedulePreferences, SchedulingConstraints, SchedulingPreferences,
    SchedulingRequest, TeamMember,
};
use install_scheduler::OptimizationGoal;

// ============================================================================
// Locations
// ============================================================================

pub const DOWNTOWN_DENVER: (f64, f64) = (39.7392, -104.9903);
pub const CAPITOL_HILL: (f64, f64) = (39.7312, -104.9826);
pub const FIVE_POINTS: (f64, f64) = (39.7555, -104.9786);
pub const AURORA: (f64, f64) = (39.7294, -104.8319);
pub const LAKEWOOD: (f64, f64) = (39.7047, -105.0814);
pub const BOULDER: (f64, f64) = (40.0150, -105.2705);
pub const COLORADO_SPRINGS: (f64, f64) = (38.8339, -104.8214);
pub const GRAND_JUNCTION: (f64, f64) = (39.0639, -108.5506);

/// A day in the test month.
pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, day).expect("valid June date")
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for installation jobs. Defaults: downtown Denver, North region,
/// June 2, one hour, medium priority, flexible start.
#[derive(Clone, Debug)]
pub struct JobBuilder {
    job: Installation,
}

impl JobBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            job: Installation {
                id: id.to_string(),
                customer_name: format!("Customer {}", id),
                address: Address {
                    street: "1600 Glenarm Pl".to_string(),
                    city: "Denver".to_string(),
                    state: "CO".to_string(),
                    zip: "80202".to_string(),
                },
                coordinates: Some(Coordinates::new(DOWNTOWN_DENVER.0, DOWNTOWN_DENVER.1)),
                region: Some("North".to_string()),
                scheduled_date: Some(june(2)),
                scheduled_time: None,
                duration_minutes: 60,
                priority: Priority::Medium,
                status: JobStatus::Pending,
                required_specializations: Vec::new(),
            },
        }
    }

    pub fn at(mut self, location: (f64, f64)) -> Self {
        self.job.coordinates = Some(Coordinates::new(location.0, location.1));
        self
    }

    pub fn ungeocoded(mut self) -> Self {
        self.job.coordinates = None;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.job.scheduled_date = Some(date);
        self
    }

    pub fn without_date(mut self) -> Self {
        self.job.scheduled_date = None;
        self
    }

    pub fn without_street(mut self) -> Self {
        self.job.address.street = String::new();
        self
    }

    pub fn starting(mut self, hour: u32, minute: u32) -> Self {
        self.job.scheduled_time = Some(at(hour, minute));
        self
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.job.duration_minutes = minutes;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.job.priority = priority;
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.job.region = Some(region.to_string());
        self
    }

    pub fn requires(mut self, specialization: &str) -> Self {
        self.job.required_specializations.push(specialization.to_string());
        self
    }

    pub fn build(self) -> Installation {
        self.job
    }
}

/// Builder for team members. Defaults: North region, based downtown,
/// capacity 5, 50 mile radius, available all of June.
#[derive(Clone, Debug)]
pub struct TechBuilder {
    member: TeamMember,
}

impl TechBuilder {
    fn with_role(id: &str, role: Role) -> Self {
        Self {
            member: TeamMember {
                id: id.to_string(),
                name: format!("Tech {}", id),
                role,
                is_active: true,
                region: "North".to_string(),
                sub_regions: Vec::new(),
                coordinates: Some(Coordinates::new(DOWNTOWN_DENVER.0, DOWNTOWN_DENVER.1)),
                travel_radius_miles: 50.0,
                capacity: 5,
                specializations: Vec::new(),
                skills: Vec::new(),
                performance: PerformanceMetrics {
                    completion_rate: 0.9,
                    customer_satisfaction: 4.5,
                    quality_score: 8.0,
                    safety_score: 8.0,
                    punctuality_score: 8.0,
                    communication_score: 8.0,
                    travel_efficiency: 0.8,
                    jobs_completed: 100,
                },
                availability: vec![AvailabilityWindow {
                    start_date: june(1),
                    end_date: june(30),
                    start_time: None,
                    end_time: None,
                    is_available: true,
                    recurrence: Recurrence::None,
                }],
                preferred_partners: Vec::new(),
                schedule_preferences: SchedulePreferences::default(),
            },
        }
    }

    pub fn lead(id: &str) -> Self {
        Self::with_role(id, Role::Lead)
    }

    pub fn assistant(id: &str) -> Self {
        Self::with_role(id, Role::Assistant)
    }

    pub fn admin(id: &str) -> Self {
        Self::with_role(id, Role::Admin)
    }

    pub fn at(mut self, location: (f64, f64)) -> Self {
        self.member.coordinates = Some(Coordinates::new(location.0, location.1));
        self
    }

    pub fn without_coordinates(mut self) -> Self {
        self.member.coordinates = None;
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.member.region = region.to_string();
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.member.capacity = capacity;
        self
    }

    pub fn radius(mut self, miles: f64) -> Self {
        self.member.travel_radius_miles = miles;
        self
    }

    pub fn specialization(mut self, specialization: &str) -> Self {
        self.member.specializations.push(specialization.to_string());
        self
    }

    pub fn skills(mut self, skills: &[&str]) -> Self {
        self.member.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn performance(mut self, performance: PerformanceMetrics) -> Self {
        self.member.performance = performance;
        self
    }

    pub fn jobs_completed(mut self, count: u32) -> Self {
        self.member.performance.jobs_completed = count;
        self
    }

    pub fn prefers(mut self, partner: &str) -> Self {
        self.member.preferred_partners.push(partner.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.member.is_active = false;
        self
    }

    pub fn time_off(mut self, date: NaiveDate) -> Self {
        self.member.availability.push(AvailabilityWindow {
            start_date: date,
            end_date: date,
            start_time: None,
            end_time: None,
            is_available: false,
            recurrence: Recurrence::None,
        });
        self
    }

    pub fn build(self) -> TeamMember {
        self.member
    }
}

/// Builder for a whole request.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    request: SchedulingRequest,
}

impl RequestBuilder {
    pub fn new(goal: OptimizationGoal) -> Self {
        Self {
            request: SchedulingRequest {
                jobs: Vec::new(),
                teams: Vec::new(),
                constraints: SchedulingConstraints::default(),
                preferences: SchedulingPreferences {
                    optimization_goal: goal,
                },
            },
        }
    }

    pub fn job(mut self, job: JobBuilder) -> Self {
        self.request.jobs.push(job.build());
        self
    }

    pub fn team(mut self, member: TechBuilder) -> Self {
        self.request.teams.push(member.build());
        self
    }

    pub fn deadline(mut self, job_id: &str, date: NaiveDate) -> Self {
        self.request.constraints.deadlines.insert(job_id.to_string(), date);
        self
    }

    pub fn requires(mut self, job_id: &str, specialization: &str) -> Self {
        self.request
            .constraints
            .required_specializations
            .entry(job_id.to_string())
            .or_default()
            .push(specialization.to_string());
        self
    }

    pub fn build(self) -> SchedulingRequest {
        self.request
    }
}
