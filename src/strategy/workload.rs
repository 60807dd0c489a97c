//! Workload-balance strategy.

use crate::context::PlanningContext;
use crate::traits::AssignmentStrategy;

use super::{LoadTracker, StrategyOutcome, eligible_leads, no_lead_reason};

/// Highest priority first, each job to the eligible lead with the lightest
/// day. A lead whose run total would pass `overload_factor` times the mean
/// jobs-per-lead ratio yields to an alternative still under that line.
pub struct WorkloadBalance;

impl AssignmentStrategy for WorkloadBalance {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a> {
        let mut outcome = StrategyOutcome::default();
        let mut load = LoadTracker::default();

        let mut jobs = ctx.jobs.clone();
        jobs.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight()));

        let mean_ratio = jobs.len() as f64 / ctx.leads.len().max(1) as f64;
        let threshold = mean_ratio * ctx.config.overload_factor;

        for job in jobs {
            let Some(date) = job.scheduled_date else {
                continue;
            };
            let candidates: Vec<_> = eligible_leads(ctx, job)
                .into_iter()
                .filter(|lead| load.has_room(lead, job))
                .collect();

            let lightest = candidates
                .iter()
                .copied()
                .min_by_key(|lead| (load.on(lead, date), load.total(lead)));

            let Some(mut chosen) = lightest else {
                outcome.reject(job, no_lead_reason(ctx, job));
                continue;
            };

            if f64::from(load.total(chosen) + 1) > threshold {
                let alternative = candidates
                    .iter()
                    .copied()
                    .filter(|lead| f64::from(load.total(lead) + 1) <= threshold)
                    .min_by_key(|lead| (load.on(lead, date), load.total(lead)));
                if let Some(alternative) = alternative {
                    chosen = alternative;
                }
            }

            outcome.place(job, chosen, &mut load);
        }

        outcome
    }
}
