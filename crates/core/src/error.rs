//! Errors shared by the member and payment operations.
//!
//! Attendance, dispatch and matching failures have their own enums next to
//! their workflows.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input rejected by the registration or payment rules.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A renewal named a plan outside the catalogue.
    #[error("Unknown plan '{0}'")]
    UnknownPlan(String),

    /// Registration with a custom plan and no explicit expiry date.
    #[error("Unknown plan '{0}'; supply expiry_date for custom plans")]
    CustomPlanWithoutExpiry(String),

    /// Adding the plan's months overflowed the calendar.
    #[error("Plan expiry date is out of range")]
    ExpiryOutOfRange,

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
