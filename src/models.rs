//! Input records: installation jobs, field technicians and the request that
//! bundles them with constraints and preferences.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Fallback for ungeocoded records.
    pub const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Job priority. Ordering follows urgency, so `Urgent > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Sorting weight: urgent=4 down to low=1.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl Address {
    /// Street, city and state must all be present; zip is optional.
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.state]
            .iter()
            .all(|part| !part.trim().is_empty())
    }
}

/// A unit of installation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    pub id: String,
    pub customer_name: String,
    pub address: Address,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    /// Customer-requested start. Jobs without one are flexible within the day.
    #[serde(default)]
    pub scheduled_time: Option<NaiveTime>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub required_specializations: Vec<String>,
}

impl Installation {
    /// Job location, or (0,0) when the job was never geocoded.
    pub fn location(&self) -> Coordinates {
        self.coordinates.unwrap_or(Coordinates::ORIGIN)
    }

    pub fn is_geocoded(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Requested start as minutes after midnight.
    pub fn requested_start_minute(&self) -> Option<u32> {
        self.scheduled_time.map(minute_of_day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Lead,
    Assistant,
    Admin,
    Scheduler,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly { days: Vec<Weekday> },
}

/// A date range during which a member is (or explicitly is not) available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl AvailabilityWindow {
    /// Whether the window applies to the given date, ignoring `is_available`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }
        match &self.recurrence {
            Recurrence::None | Recurrence::Daily => true,
            Recurrence::Weekly { days } => days.contains(&date.weekday()),
        }
    }
}

/// Technician performance. Every field keeps the scale its source reports:
///
/// | Field | Scale |
/// |-------|-------|
/// | `completion_rate` | 0–1 fraction |
/// | `customer_satisfaction` | 0–5 rating |
/// | `quality_score`, `safety_score`, `punctuality_score`, `communication_score` | 0–10 |
/// | `travel_efficiency` | 0–1 fraction |
/// | `jobs_completed` | count |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub completion_rate: f64,
    pub customer_satisfaction: f64,
    pub quality_score: f64,
    pub safety_score: f64,
    pub punctuality_score: f64,
    pub communication_score: f64,
    pub travel_efficiency: f64,
    pub jobs_completed: u32,
}

impl PerformanceMetrics {
    /// Mean of the four 0–10 field scores, still on the 0–10 scale.
    pub fn field_score_mean(&self) -> f64 {
        (self.quality_score + self.safety_score + self.punctuality_score + self.communication_score)
            / 4.0
    }

    /// `field_score_mean` converted from 0–10 to a 0–1 fraction.
    pub fn mean_score_fraction(&self) -> f64 {
        self.field_score_mean() / 10.0
    }

    /// Weighted composite on a 0–100 scale.
    ///
    /// Quality 30%, safety 25%, punctuality 20%, communication 15%,
    /// completion rate 10%.
    pub fn composite(&self) -> f64 {
        let composite = self.quality_score * 10.0 * 0.30
            + self.safety_score * 10.0 * 0.25
            + self.punctuality_score * 10.0 * 0.20
            + self.communication_score * 10.0 * 0.15
            + self.completion_rate * 100.0 * 0.10;
        composite.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePreferences {
    pub preferred_start_time: Option<NaiveTime>,
    pub preferred_days: Vec<Weekday>,
}

/// A field technician or office member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub region: String,
    #[serde(default)]
    pub sub_regions: Vec<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub travel_radius_miles: f64,
    /// Maximum jobs per day.
    pub capacity: u32,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub performance: PerformanceMetrics,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub preferred_partners: Vec<String>,
    #[serde(default)]
    pub schedule_preferences: SchedulePreferences,
}

impl TeamMember {
    /// Home base, or (0,0) when the member has no coordinates.
    pub fn base_location(&self) -> Coordinates {
        self.coordinates.unwrap_or(Coordinates::ORIGIN)
    }

    /// Available when some available window covers the date and no
    /// unavailable (time-off) window does.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        let mut available = false;
        for window in self.availability.iter().filter(|w| w.covers(date)) {
            if !window.is_available {
                return false;
            }
            available = true;
        }
        available
    }

    pub fn serves_region(&self, region: &str) -> bool {
        self.region.eq_ignore_ascii_case(region)
            || self.sub_regions.iter().any(|r| r.eq_ignore_ascii_case(region))
    }

    /// True when nothing is required or at least one specialization matches.
    pub fn matches_any_specialization(&self, required: &[String]) -> bool {
        required.is_empty() || specialization_matches(&self.specializations, required) > 0
    }

    /// Fraction of the required specializations this member holds (1.0 when
    /// nothing is required).
    pub fn specialization_match_ratio(&self, required: &[String]) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        specialization_matches(&self.specializations, required) as f64 / required.len() as f64
    }
}

fn specialization_matches(held: &[String], required: &[String]) -> usize {
    required
        .iter()
        .filter(|req| held.iter().any(|s| s.eq_ignore_ascii_case(req)))
        .count()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConstraints {
    pub deadlines: HashMap<String, NaiveDate>,
    pub required_specializations: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    TravelDistance,
    WorkloadBalance,
    DeadlinePriority,
    CustomerSatisfaction,
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPreferences {
    pub optimization_goal: OptimizationGoal,
}

/// Everything one optimization run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub jobs: Vec<Installation>,
    pub teams: Vec<TeamMember>,
    #[serde(default)]
    pub constraints: SchedulingConstraints,
    #[serde(default)]
    pub preferences: SchedulingPreferences,
}

impl SchedulingRequest {
    /// Required specializations for a job: its own list merged with any
    /// request-level constraint, without duplicates.
    pub fn required_specializations(&self, job: &Installation) -> Vec<String> {
        let mut required = job.required_specializations.clone();
        if let Some(extra) = self.constraints.required_specializations.get(&job.id) {
            for spec in extra {
                if !required.iter().any(|r| r.eq_ignore_ascii_case(spec)) {
                    required.push(spec.clone());
                }
            }
        }
        required
    }

    pub fn deadline(&self, job_id: &str) -> Option<NaiveDate> {
        self.constraints.deadlines.get(job_id).copied()
    }
}

/// Minutes after midnight.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn default_true() -> bool {
    true
}
