// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::target_status::TargetSettingStatus;
use crate::types::FieldError;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The target list failed validation.
    InvalidTargets {
        /// Every field-level failure that was found.
        errors: Vec<FieldError>,
    },
    /// Revision feedback is missing or out of bounds.
    InvalidFeedback(String),
    /// Cycle year is outside the accepted range.
    InvalidCycleYear(String),
    /// A stored status string is not a known status.
    InvalidStatus {
        /// The unrecognized value.
        status: String,
    },
    /// The record's current status does not accept the requested action.
    InvalidStatusTransition {
        /// The status the record is in.
        current: TargetSettingStatus,
        /// The attempted action.
        action: String,
    },
    /// The employee has no manager to submit to.
    NoManagerAssigned {
        /// The employee attempting to create a target setting.
        employee_id: i64,
    },
    /// A target setting already exists for this employee and year.
    DuplicateTargetSetting {
        /// The owning employee.
        employee_id: i64,
        /// The appraisal year.
        cycle_year: i32,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargets { errors } => {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Invalid targets: {}", details.join("; "))
            }
            Self::InvalidFeedback(msg) => write!(f, "Invalid feedback: {msg}"),
            Self::InvalidCycleYear(msg) => write!(f, "Invalid cycle year: {msg}"),
            Self::InvalidStatus { status } => {
                write!(f, "Unknown target setting status '{status}'")
            }
            Self::InvalidStatusTransition { current, action } => {
                write!(
                    f,
                    "Cannot {action} a target setting in status '{current}'"
                )
            }
            Self::NoManagerAssigned { employee_id } => {
                write!(f, "Employee {employee_id} has no assigned manager")
            }
            Self::DuplicateTargetSetting {
                employee_id,
                cycle_year,
            } => {
                write!(
                    f,
                    "Target setting for employee {employee_id} already exists for cycle year {cycle_year}"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
