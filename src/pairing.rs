//! Lead/assistant compatibility scoring and greedy team pairing.
//!
//! # Score components (each 0–100)
//!
//! | Component | Weight | Basis |
//! |-----------|--------|-------|
//! | Geographic | 30% | Region tiers, then distance bands |
//! | Skills | 25% | Overlap ratio, 30–50% is the sweet spot |
//! | Experience | 20% | Lead's completed-job lead over the assistant |
//! | Preference | 15% | Preferred-partner lists and schedule habits |
//! | Performance | 10% | Mean of both members' composites |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::haversine::calculate_distance;
use crate::models::{Role, TeamMember, minute_of_day};

const GEOGRAPHIC_WEIGHT: f64 = 0.30;
const SKILL_WEIGHT: f64 = 0.25;
const EXPERIENCE_WEIGHT: f64 = 0.20;
const PREFERENCE_WEIGHT: f64 = 0.15;
const PERFORMANCE_WEIGHT: f64 = 0.10;

/// Preferred start times within this many minutes count as matching.
const START_TIME_TOLERANCE_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityBreakdown {
    pub geographic: f64,
    pub skills: f64,
    pub experience: f64,
    pub preference: f64,
    pub performance: f64,
}

impl CompatibilityBreakdown {
    /// Weighted total on a 0–100 scale.
    pub fn total(&self) -> f64 {
        (self.geographic * GEOGRAPHIC_WEIGHT
            + self.skills * SKILL_WEIGHT
            + self.experience * EXPERIENCE_WEIGHT
            + self.preference * PREFERENCE_WEIGHT
            + self.performance * PERFORMANCE_WEIGHT)
            .clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPairing {
    pub lead_id: String,
    pub assistant_id: String,
    pub compatibility_score: f64,
    pub breakdown: CompatibilityBreakdown,
}

/// Compatibility of a lead with an assistant, 0–100.
pub fn calculate_compatibility_score(lead: &TeamMember, assistant: &TeamMember) -> f64 {
    compatibility_breakdown(lead, assistant).total()
}

pub fn compatibility_breakdown(lead: &TeamMember, assistant: &TeamMember) -> CompatibilityBreakdown {
    CompatibilityBreakdown {
        geographic: geographic_score(lead, assistant),
        skills: skill_score(lead, assistant),
        experience: experience_score(lead, assistant),
        preference: preference_score(lead, assistant),
        performance: (lead.performance.composite() + assistant.performance.composite()) / 2.0,
    }
}

fn geographic_score(lead: &TeamMember, assistant: &TeamMember) -> f64 {
    if lead.region.eq_ignore_ascii_case(&assistant.region) {
        return 100.0;
    }
    if lead.sub_regions.iter().any(|r| r.eq_ignore_ascii_case(&assistant.region)) {
        return 80.0;
    }
    if assistant.sub_regions.iter().any(|r| r.eq_ignore_ascii_case(&lead.region)) {
        return 70.0;
    }

    let (Some(a), Some(b)) = (lead.coordinates, assistant.coordinates) else {
        return 0.0;
    };
    match calculate_distance(a, b) {
        d if d <= 10.0 => 60.0,
        d if d <= 25.0 => 40.0,
        d if d <= 50.0 => 20.0,
        _ => 0.0,
    }
}

/// Some shared ground helps; near-identical skill sets add nothing.
fn skill_score(lead: &TeamMember, assistant: &TeamMember) -> f64 {
    let lead_skills: HashSet<String> = lead.skills.iter().map(|s| s.to_lowercase()).collect();
    let assistant_skills: HashSet<String> = assistant.skills.iter().map(|s| s.to_lowercase()).collect();

    let union = lead_skills.union(&assistant_skills).count();
    if union == 0 {
        return 50.0;
    }
    let overlap = lead_skills.intersection(&assistant_skills).count() as f64 / union as f64;

    if (0.3..=0.5).contains(&overlap) {
        100.0
    } else if overlap < 0.3 {
        50.0 + overlap / 0.3 * 40.0
    } else {
        100.0 - (overlap - 0.5) * 100.0
    }
}

fn experience_score(lead: &TeamMember, assistant: &TeamMember) -> f64 {
    let gap = i64::from(lead.performance.jobs_completed) - i64::from(assistant.performance.jobs_completed);
    match gap {
        g if g >= 50 => 100.0,
        g if g >= 20 => 80.0,
        g if g >= 0 => 60.0,
        _ => 30.0,
    }
}

fn preference_score(lead: &TeamMember, assistant: &TeamMember) -> f64 {
    let mut score = 0.0;
    if lead.preferred_partners.contains(&assistant.id) {
        score += 25.0;
    }
    if assistant.preferred_partners.contains(&lead.id) {
        score += 25.0;
    }

    let lead_prefs = &lead.schedule_preferences;
    let assistant_prefs = &assistant.schedule_preferences;
    if lead_prefs
        .preferred_days
        .iter()
        .any(|day| assistant_prefs.preferred_days.contains(day))
    {
        score += 25.0;
    }
    if let (Some(a), Some(b)) = (lead_prefs.preferred_start_time, assistant_prefs.preferred_start_time) {
        if minute_of_day(a).abs_diff(minute_of_day(b)) <= START_TIME_TOLERANCE_MINUTES {
            score += 25.0;
        }
    }
    score
}

/// Greedy pairing: leads by completion rate (best first) each take the
/// highest-scoring unused assistant at or above `min_score`. Ties go to the
/// assistant listed first. Leads with no qualifying assistant stay unpaired.
/// Not a global optimum.
pub fn find_optimal_pairings(team_members: &[&TeamMember], region: Option<&str>, min_score: f64) -> Vec<TeamPairing> {
    let in_scope = |member: &&&TeamMember| member.is_active && region.is_none_or(|r| member.serves_region(r));

    let mut leads: Vec<&TeamMember> = team_members
        .iter()
        .filter(in_scope)
        .filter(|m| m.role == Role::Lead)
        .copied()
        .collect();
    leads.sort_by(|a, b| {
        b.performance
            .completion_rate
            .total_cmp(&a.performance.completion_rate)
    });

    let assistants: Vec<&TeamMember> = team_members
        .iter()
        .filter(in_scope)
        .filter(|m| m.role == Role::Assistant)
        .copied()
        .collect();

    let mut used: HashSet<&str> = HashSet::new();
    let mut pairings = Vec::new();

    for lead in leads {
        let mut best: Option<(&TeamMember, CompatibilityBreakdown)> = None;
        for &assistant in assistants.iter().filter(|a| !used.contains(a.id.as_str())) {
            let breakdown = compatibility_breakdown(lead, assistant);
            let total = breakdown.total();
            if total >= min_score && best.is_none_or(|(_, top)| total > top.total()) {
                best = Some((assistant, breakdown));
            }
        }

        match best {
            Some((assistant, breakdown)) => {
                used.insert(assistant.id.as_str());
                pairings.push(TeamPairing {
                    lead_id: lead.id.clone(),
                    assistant_id: assistant.id.clone(),
                    compatibility_score: breakdown.total(),
                    breakdown,
                });
            }
            None => tracing::debug!(lead = %lead.id, "no assistant meets the pairing threshold"),
        }
    }

    pairings
}
