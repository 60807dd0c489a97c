//! Contract violations that abort an optimization run.
//!
//! Business outcomes (unassignable jobs, conflicts, overload) are result
//! fields, never errors.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("duplicate installation id: {0}")]
    DuplicateInstallation(String),
    #[error("duplicate team member id: {0}")]
    DuplicateTeamMember(String),
    #[error("availability window for {member} ends ({end}) before it starts ({start})")]
    InvalidAvailabilityDates {
        member: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("availability window for {member} starting {start} has an end time before its start time")]
    InvalidAvailabilityTimes { member: String, start: NaiveDate },
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
