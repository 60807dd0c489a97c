//! End-to-end engine tests
//!
//! Scenarios, coverage and capacity guarantees, conflict handling and the
//! JSON shape of requests and results.

mod fixtures;

use std::collections::HashSet;

use install_scheduler::cluster::create_geographic_clusters;
use install_scheduler::haversine::calculate_distance;
use install_scheduler::models::{Installation, Priority};
use install_scheduler::schedule::{ConflictKind, RejectionReason, UnassignedReason, WorkloadStatus};
use install_scheduler::strategy::deadline_processing_order;
use install_scheduler::{EngineConfig, EngineError, OptimizationGoal, SchedulingEngine, SchedulingRequest, SchedulingResult};

use fixtures::*;

// ============================================================================
// Helpers
// ============================================================================

fn run(request: &SchedulingRequest) -> SchedulingResult {
    SchedulingEngine::new(EngineConfig::default())
        .expect("engine")
        .optimize_schedule(request)
        .expect("optimize schedule")
}

fn unassigned_reason(result: &SchedulingResult, id: &str) -> Option<UnassignedReason> {
    result
        .unassigned_jobs
        .iter()
        .find(|u| u.installation.id == id)
        .map(|u| u.reason)
}

const ALL_GOALS: [OptimizationGoal; 5] = [
    OptimizationGoal::TravelDistance,
    OptimizationGoal::WorkloadBalance,
    OptimizationGoal::DeadlinePriority,
    OptimizationGoal::CustomerSatisfaction,
    OptimizationGoal::Hybrid,
];

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_simple_assignment() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("j1"))
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 1);
    assert!(result.unassigned_jobs.is_empty());
    assert!(result.conflicts.is_empty());

    let assignment = &result.assignments[0];
    assert_eq!(assignment.lead_id, "t1");
    assert_eq!(assignment.start_time, at(8, 0));
    assert_eq!(assignment.end_time, at(9, 0));
    assert_eq!(assignment.strategy, OptimizationGoal::Hybrid);

    let metrics = &result.optimization_metrics;
    assert!((metrics.utilization_rate - 0.2).abs() < 1e-9);
    assert_eq!(metrics.geographic_efficiency, 1.0);
    assert_eq!(metrics.deadline_compliance, 1.0);
    assert_eq!(metrics.conflict_rate, 0.0);

    let day = &result.schedule_by_date[&june(2)];
    assert_eq!(day.assignments.len(), 1);
    assert_eq!(day.technician_workloads[0].status, WorkloadStatus::Underutilized);
}

#[test]
fn test_capacity_overflow_leaves_one_unassigned() {
    let request = RequestBuilder::new(OptimizationGoal::WorkloadBalance)
        .job(JobBuilder::new("j1"))
        .job(JobBuilder::new("j2").at(CAPITOL_HILL))
        .team(TechBuilder::lead("t1").capacity(1))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.unassigned_jobs.len(), 1);
    assert_eq!(unassigned_reason(&result, "j2"), Some(UnassignedReason::CapacityExhausted));
    assert!(result.recommendations[0].starts_with("1 job(s) could not be assigned"));
}

#[test]
fn test_job_outside_every_travel_radius() {
    let request = RequestBuilder::new(OptimizationGoal::TravelDistance)
        .job(JobBuilder::new("far").at(GRAND_JUNCTION))
        .team(TechBuilder::lead("t1").radius(50.0))
        .team(TechBuilder::lead("t2").at(COLORADO_SPRINGS).radius(30.0))
        .build();

    let result = run(&request);

    assert!(result.assignments.is_empty());
    assert!(result.is_unassigned("far"));
    assert_eq!(unassigned_reason(&result, "far"), Some(UnassignedReason::OutsideTravelRadius));
}

#[test]
fn test_missing_specialization_is_never_eligible() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("battery").requires("battery_storage"))
        .job(JobBuilder::new("roof").at(FIVE_POINTS))
        .team(TechBuilder::lead("t1").specialization("solar_panel"))
        .requires("roof", "SOLAR_PANEL")
        .build();

    let result = run(&request);

    assert_eq!(unassigned_reason(&result, "battery"), Some(UnassignedReason::NoEligibleTechnician));
    assert_eq!(result.assignment_for("roof").map(|a| a.lead_id.as_str()), Some("t1"));
}

#[test]
fn test_office_roles_and_inactive_members_get_no_work() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("j1"))
        .team(TechBuilder::admin("office"))
        .team(TechBuilder::lead("retired").inactive())
        .build();

    let result = run(&request);

    assert!(result.assignments.is_empty());
    assert_eq!(unassigned_reason(&result, "j1"), Some(UnassignedReason::NoEligibleTechnician));
}

#[test]
fn test_time_off_moves_work_to_available_lead() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("j1"))
        .team(TechBuilder::lead("t1").time_off(june(2)))
        .team(TechBuilder::lead("t2").at(AURORA))
        .build();

    let result = run(&request);

    assert_eq!(result.assignment_for("j1").map(|a| a.lead_id.as_str()), Some("t2"));
}

#[test]
fn test_ungeocoded_jobs_under_travel_distance() {
    let request = RequestBuilder::new(OptimizationGoal::TravelDistance)
        .job(JobBuilder::new("lost").ungeocoded())
        .job(JobBuilder::new("found"))
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert_eq!(unassigned_reason(&result, "lost"), Some(UnassignedReason::MissingCoordinates));
    assert!(result.assignment_for("found").is_some());
}

// ============================================================================
// Properties
// ============================================================================

fn mixed_request(goal: OptimizationGoal) -> SchedulingRequest {
    RequestBuilder::new(goal)
        .job(JobBuilder::new("downtown"))
        .job(JobBuilder::new("capitol").at(CAPITOL_HILL).priority(Priority::High))
        .job(JobBuilder::new("aurora").at(AURORA).on(june(3)))
        .job(JobBuilder::new("boulder").at(BOULDER).priority(Priority::Urgent))
        .job(JobBuilder::new("springs").at(COLORADO_SPRINGS))
        .job(JobBuilder::new("remote").at(GRAND_JUNCTION))
        .job(JobBuilder::new("nogps").ungeocoded())
        .job(JobBuilder::new("fixed").at(FIVE_POINTS).starting(9, 0))
        .job(JobBuilder::new("clash").at(LAKEWOOD).starting(9, 30).priority(Priority::Low))
        .job(JobBuilder::new("battery").requires("battery_storage"))
        .job(JobBuilder::new("undated").without_date())
        .job(JobBuilder::new("nostreet").without_street())
        .team(TechBuilder::lead("t1").capacity(3))
        .team(TechBuilder::lead("t2").at(LAKEWOOD).capacity(2).radius(30.0))
        .team(TechBuilder::lead("t3").at(COLORADO_SPRINGS).capacity(2))
        .team(TechBuilder::assistant("a1").jobs_completed(10))
        .deadline("aurora", june(5))
        .deadline("capitol", june(1))
        .build()
}

#[test]
fn test_every_valid_job_accounted_for_exactly_once() {
    for goal in ALL_GOALS {
        let request = mixed_request(goal);
        let result = run(&request);

        let rejected: HashSet<&str> = result
            .rejected_input
            .iter()
            .map(|r| r.installation.id.as_str())
            .collect();
        assert_eq!(rejected, HashSet::from(["undated", "nostreet"]), "{:?}", goal);

        for job in request.jobs.iter().filter(|j| !rejected.contains(j.id.as_str())) {
            let assigned = result
                .assignments
                .iter()
                .filter(|a| a.installation_id == job.id)
                .count();
            let unassigned = result
                .unassigned_jobs
                .iter()
                .filter(|u| u.installation.id == job.id)
                .count();
            assert_eq!(assigned + unassigned, 1, "{} under {:?}", job.id, goal);
        }
    }
}

#[test]
fn test_capacity_violations_never_hidden() {
    for goal in ALL_GOALS {
        let result = run(&mixed_request(goal));

        for day in result.schedule_by_date.values() {
            for workload in &day.technician_workloads {
                if workload.job_count > workload.capacity {
                    assert!(
                        result.unresolved_conflicts().any(|c| c.kind == ConflictKind::CapacityExceeded
                            && c.technician_id == workload.technician_id
                            && c.date == day.date),
                        "hidden overload for {} on {} under {:?}",
                        workload.technician_id,
                        day.date,
                        goal
                    );
                }
            }
        }
    }
}

#[test]
fn test_overbooked_day_is_trimmed_to_capacity() {
    let locations = [DOWNTOWN_DENVER, CAPITOL_HILL, FIVE_POINTS, AURORA];
    let mut builder = RequestBuilder::new(OptimizationGoal::Hybrid)
        .team(TechBuilder::lead("t1").capacity(3))
        .team(TechBuilder::lead("t2").capacity(3));
    for i in 0..8 {
        builder = builder.job(JobBuilder::new(&format!("j{}", i)).at(locations[i % locations.len()]));
    }

    let result = run(&builder.build());

    assert_eq!(result.assignments.len(), 6);
    assert_eq!(result.unassigned_jobs.len(), 2);
    assert!(result
        .unassigned_jobs
        .iter()
        .all(|u| u.reason == UnassignedReason::CapacityExhausted));
    assert_eq!(result.conflicts.len(), 2);
    assert!(result.conflicts.iter().all(|c| c.resolved));
    assert_eq!(result.optimization_metrics.conflict_rate, 0.0);
}

#[test]
fn test_travel_distance_respects_radius() {
    let request = RequestBuilder::new(OptimizationGoal::TravelDistance)
        .job(JobBuilder::new("d1"))
        .job(JobBuilder::new("d2").at(CAPITOL_HILL))
        .job(JobBuilder::new("d3").at(FIVE_POINTS))
        .job(JobBuilder::new("c1").at(COLORADO_SPRINGS))
        .team(TechBuilder::lead("denver").radius(20.0))
        .team(TechBuilder::lead("springs").at(COLORADO_SPRINGS).radius(20.0))
        .build();

    let result = run(&request);

    let jobs: Vec<&Installation> = request.jobs.iter().collect();
    let clusters = create_geographic_clusters(&jobs, EngineConfig::default().cluster_radius_miles);
    for assignment in &result.assignments {
        let cluster = clusters
            .clusters
            .iter()
            .find(|c| c.job_ids.contains(&assignment.installation_id))
            .expect("job is clustered");
        let lead = request
            .teams
            .iter()
            .find(|t| t.id == assignment.lead_id)
            .expect("lead exists");
        assert!(calculate_distance(lead.base_location(), cluster.centroid) <= lead.travel_radius_miles);
    }

    assert_eq!(result.assignment_for("d2").map(|a| a.lead_id.as_str()), Some("denver"));
    assert_eq!(result.assignment_for("c1").map(|a| a.lead_id.as_str()), Some("springs"));
}

#[test]
fn test_travel_distance_overflow_stays_in_radius() {
    let request = RequestBuilder::new(OptimizationGoal::TravelDistance)
        .job(JobBuilder::new("d1"))
        .job(JobBuilder::new("d2"))
        .team(TechBuilder::lead("denver").capacity(1))
        .team(TechBuilder::lead("springs").at(COLORADO_SPRINGS).radius(20.0))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.assignments[0].lead_id, "denver");
    assert_eq!(result.unassigned_jobs.len(), 1);
    assert_eq!(result.unassigned_jobs[0].reason, UnassignedReason::CapacityExhausted);
}

#[test]
fn test_deadline_processing_order() {
    let request = RequestBuilder::new(OptimizationGoal::DeadlinePriority)
        .job(JobBuilder::new("late"))
        .job(JobBuilder::new("open").priority(Priority::Urgent))
        .job(JobBuilder::new("early"))
        .deadline("late", june(10))
        .deadline("early", june(5))
        .build();

    let jobs: Vec<&Installation> = request.jobs.iter().collect();
    let order: Vec<&str> = deadline_processing_order(&jobs, &request)
        .iter()
        .map(|j| j.id.as_str())
        .collect();

    assert_eq!(order, vec!["early", "late", "open"]);
}

#[test]
fn test_deadline_compliance_metric() {
    let request = RequestBuilder::new(OptimizationGoal::DeadlinePriority)
        .job(JobBuilder::new("on_time").on(june(4)))
        .job(JobBuilder::new("overdue").at(CAPITOL_HILL).on(june(4)))
        .team(TechBuilder::lead("t1"))
        .deadline("on_time", june(4))
        .deadline("overdue", june(3))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 2);
    assert!((result.optimization_metrics.deadline_compliance - 0.5).abs() < 1e-9);
}

// ============================================================================
// Conflicts and pairing
// ============================================================================

#[test]
fn test_overlapping_appointments_reassigned() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("first").starting(9, 0))
        .job(JobBuilder::new("second").starting(9, 0).priority(Priority::Low))
        .team(TechBuilder::lead("t1"))
        .team(TechBuilder::lead("t2").at(AURORA))
        .build();

    let result = run(&request);

    assert_eq!(result.assignment_for("first").map(|a| a.lead_id.as_str()), Some("t1"));
    assert_eq!(result.assignment_for("second").map(|a| a.lead_id.as_str()), Some("t2"));
    assert!(result
        .conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::TimeOverlap && c.resolved));
    assert_eq!(result.unresolved_conflicts().count(), 0);
    assert!(result.recommendations.iter().any(|r| r.contains("resolved")));
}

#[test]
fn test_overlap_without_alternative_is_demoted() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("first").starting(9, 0).priority(Priority::High))
        .job(JobBuilder::new("second").starting(9, 30))
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert!(result.assignment_for("first").is_some());
    assert_eq!(unassigned_reason(&result, "second"), Some(UnassignedReason::ConflictUnresolved));
}

#[test]
fn test_travel_distance_reassignment_stays_in_radius() {
    let request = RequestBuilder::new(OptimizationGoal::TravelDistance)
        .job(JobBuilder::new("first").starting(9, 0).priority(Priority::High))
        .job(JobBuilder::new("second").starting(9, 0))
        .team(TechBuilder::lead("denver"))
        .team(TechBuilder::lead("springs").at(COLORADO_SPRINGS).radius(20.0))
        .build();

    let result = run(&request);

    assert_eq!(result.assignment_for("first").map(|a| a.lead_id.as_str()), Some("denver"));
    assert!(result.assignments.iter().all(|a| a.lead_id != "springs"));
    assert_eq!(unassigned_reason(&result, "second"), Some(UnassignedReason::ConflictUnresolved));
}

#[test]
fn test_day_past_midnight_is_trimmed() {
    let mut builder = RequestBuilder::new(OptimizationGoal::Hybrid).team(TechBuilder::lead("t1").capacity(12));
    for i in 0..12 {
        builder = builder.job(JobBuilder::new(&format!("j{:02}", i)).duration(120));
    }

    let result = run(&builder.build());

    // 08:00 start, 120 minute jobs plus 15 minute buffers: seven fit before midnight
    assert_eq!(result.assignments.len(), 7);
    assert!(result.assignments.iter().all(|a| a.end_time > a.start_time));
    assert_eq!(result.unassigned_jobs.len(), 5);
    assert!(result
        .unassigned_jobs
        .iter()
        .all(|u| u.reason == UnassignedReason::CapacityExhausted));
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].kind, ConflictKind::WorkdayOverrun);
    assert!(result.conflicts[0].resolved);
}

#[test]
fn test_fixed_job_running_past_midnight_is_demoted() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("evening").starting(23, 0).duration(120))
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert!(result.is_unassigned("evening"));
    assert!(result
        .conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::WorkdayOverrun && c.resolved));
    assert!(result.assignments.is_empty());
}

#[test]
fn test_compatible_assistant_is_attached() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("j1"))
        .job(JobBuilder::new("j2").on(june(3)))
        .team(TechBuilder::lead("t1"))
        .team(TechBuilder::assistant("a1").jobs_completed(20).time_off(june(3)))
        .build();

    let result = run(&request);

    assert_eq!(
        result.assignment_for("j1").and_then(|a| a.assistant_id.as_deref()),
        Some("a1")
    );
    assert_eq!(result.assignment_for("j2").and_then(|a| a.assistant_id.as_deref()), None);
}

#[test]
fn test_assistants_can_be_disabled() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("j1"))
        .team(TechBuilder::lead("t1"))
        .team(TechBuilder::assistant("a1").jobs_completed(20))
        .build();
    let config = EngineConfig {
        assign_assistants: false,
        ..Default::default()
    };

    let result = SchedulingEngine::new(config)
        .expect("engine")
        .optimize_schedule(&request)
        .expect("optimize");

    assert_eq!(result.assignments[0].assistant_id, None);
}

// ============================================================================
// Input contract
// ============================================================================

#[test]
fn test_rejected_input_is_reported() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("ok"))
        .job(JobBuilder::new("undated").without_date())
        .job(JobBuilder::new("nostreet").without_street())
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.rejected_input.len(), 2);
    assert_eq!(result.rejected_input[0].reason, RejectionReason::MissingScheduledDate);
    assert_eq!(result.rejected_input[1].reason, RejectionReason::IncompleteAddress);
    assert!(result.recommendations[0].starts_with("2 job(s) were skipped"));
}

#[test]
fn test_invalid_durations_are_rejected() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .job(JobBuilder::new("endless").duration(u32::MAX))
        .job(JobBuilder::new("instant").duration(0))
        .job(JobBuilder::new("ok"))
        .team(TechBuilder::lead("t1"))
        .build();

    let result = run(&request);

    assert_eq!(result.assignments.len(), 1);
    assert!(result.assignment_for("ok").is_some());
    assert_eq!(result.rejected_input.len(), 2);
    assert!(result
        .rejected_input
        .iter()
        .all(|r| r.reason == RejectionReason::InvalidDuration));
}

#[test]
fn test_duplicate_team_member_is_an_error() {
    let request = RequestBuilder::new(OptimizationGoal::Hybrid)
        .team(TechBuilder::lead("t1"))
        .team(TechBuilder::lead("t1"))
        .build();

    let engine = SchedulingEngine::new(EngineConfig::default()).expect("engine");
    let err = engine.optimize_schedule(&request).unwrap_err();

    assert_eq!(err, EngineError::DuplicateTeamMember("t1".to_string()));
}

#[test]
fn test_request_and_result_json_shape() {
    let json = r#"{
        "jobs": [{
            "id": "j1",
            "customer_name": "Rivera",
            "address": {"street": "1 Main St", "city": "Denver", "state": "CO"},
            "coordinates": {"lat": 39.7392, "lng": -104.9903},
            "scheduled_date": "2026-06-02",
            "duration_minutes": 90,
            "priority": "high"
        }, {
            "id": "j2",
            "customer_name": "Okafor",
            "address": {"street": "9 Elm St", "city": "Denver", "state": "CO"},
            "scheduled_date": "2026-06-02",
            "duration_minutes": 60,
            "required_specializations": ["ev_charger"]
        }],
        "teams": [{
            "id": "t1",
            "name": "Sam",
            "role": "lead",
            "region": "North",
            "coordinates": {"lat": 39.7392, "lng": -104.9903},
            "travel_radius_miles": 40,
            "capacity": 4,
            "availability": [{"start_date": "2026-06-01", "end_date": "2026-06-30"}]
        }],
        "preferences": {"optimization_goal": "workload_balance"}
    }"#;

    let request: SchedulingRequest = serde_json::from_str(json).expect("parse request");
    let result = run(&request);
    let value = serde_json::to_value(&result).expect("serialize result");

    assert_eq!(value["assignments"][0]["installation_id"], "j1");
    assert_eq!(value["assignments"][0]["start_time"], "08:00:00");
    assert_eq!(value["assignments"][0]["strategy"], "workload_balance");
    assert_eq!(value["unassigned_jobs"][0]["id"], "j2");
    assert_eq!(value["unassigned_jobs"][0]["reason"], "no_eligible_technician");
    assert!(value["schedule_by_date"]["2026-06-02"].is_object());

    let back: SchedulingResult = serde_json::from_value(value).expect("parse result");
    assert_eq!(back, result);
}
