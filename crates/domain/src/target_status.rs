// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Target-setting status tracking and transition rules.
//!
//! A target setting moves through a fixed lifecycle. Employees edit and
//! submit, the manager-of-record approves or sends it back. The HR states
//! exist so stored rows can carry them, but no workflow action reaches them.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a single target setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetSettingStatus {
    /// Editable, not yet submitted.
    #[default]
    Draft,
    /// Waiting on the manager-of-record.
    SubmittedToManager,
    /// Sent back to the employee with feedback.
    RevisionRequested,
    /// Approved by the manager-of-record.
    ManagerApproved,
    /// Forwarded to HR.
    SubmittedToHr,
    /// Target setting finished for the cycle.
    TargetSettingComplete,
}

impl TargetSettingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::SubmittedToManager,
        Self::RevisionRequested,
        Self::ManagerApproved,
        Self::SubmittedToHr,
        Self::TargetSettingComplete,
    ];

    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::SubmittedToManager => "submitted_to_manager",
            Self::RevisionRequested => "revision_requested",
            Self::ManagerApproved => "manager_approved",
            Self::SubmittedToHr => "submitted_to_hr",
            Self::TargetSettingComplete => "target_setting_complete",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted_to_manager" => Ok(Self::SubmittedToManager),
            "revision_requested" => Ok(Self::RevisionRequested),
            "manager_approved" => Ok(Self::ManagerApproved),
            "submitted_to_hr" => Ok(Self::SubmittedToHr),
            "target_setting_complete" => Ok(Self::TargetSettingComplete),
            _ => Err(DomainError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Checks if the workflow permits moving from this status to `target`.
    ///
    /// Valid transitions are:
    /// - `draft` → `draft` (draft save) or `submitted_to_manager`
    /// - `revision_requested` → `draft` (draft save) or `submitted_to_manager`
    /// - `submitted_to_manager` → `manager_approved` or `revision_requested`
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Draft | Self::RevisionRequested,
                Self::Draft | Self::SubmittedToManager
            ) | (
                Self::SubmittedToManager,
                Self::ManagerApproved | Self::RevisionRequested
            )
        )
    }
}

impl FromStr for TargetSettingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for TargetSettingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in TargetSettingStatus::ALL {
            let s = status.as_str();
            match TargetSettingStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_invalid_status_string() {
        let result = TargetSettingStatus::from_str("approved");
        assert!(matches!(result, Err(DomainError::InvalidStatus { .. })));
    }

    #[test]
    fn test_status_strings_are_case_sensitive() {
        assert!(TargetSettingStatus::from_str("DRAFT").is_err());
    }

    #[test]
    fn test_valid_transitions() {
        use TargetSettingStatus::{
            Draft, ManagerApproved, RevisionRequested, SubmittedToManager,
        };

        assert!(Draft.can_transition_to(Draft));
        assert!(Draft.can_transition_to(SubmittedToManager));
        assert!(RevisionRequested.can_transition_to(Draft));
        assert!(RevisionRequested.can_transition_to(SubmittedToManager));
        assert!(SubmittedToManager.can_transition_to(ManagerApproved));
        assert!(SubmittedToManager.can_transition_to(RevisionRequested));
    }

    #[test]
    fn test_invalid_transitions() {
        use TargetSettingStatus::{
            Draft, ManagerApproved, RevisionRequested, SubmittedToHr, SubmittedToManager,
            TargetSettingComplete,
        };

        assert!(!Draft.can_transition_to(ManagerApproved));
        assert!(!Draft.can_transition_to(RevisionRequested));
        assert!(!SubmittedToManager.can_transition_to(Draft));
        assert!(!SubmittedToManager.can_transition_to(SubmittedToManager));
        assert!(!ManagerApproved.can_transition_to(Draft));
        assert!(!ManagerApproved.can_transition_to(SubmittedToHr));

        for target in TargetSettingStatus::ALL {
            assert!(!SubmittedToHr.can_transition_to(target));
            assert!(!TargetSettingComplete.can_transition_to(target));
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&TargetSettingStatus::SubmittedToManager).ok();
        assert_eq!(json.as_deref(), Some("\"submitted_to_manager\""));
    }
}
