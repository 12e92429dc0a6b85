// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_domain::Target;

/// A command represents user intent against an existing target setting.
///
/// Commands are the only way to request state changes. Creation has its
/// own input type, [`CreateTargetSetting`], because there is no record yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the target list of an editable record.
    UpdateDraft {
        /// The new target list. Already checked with the relaxed rules.
        targets: Vec<Target>,
        /// Replacement role text. `None` keeps the stored value.
        current_role: Option<String>,
        /// Replacement goal text. `None` keeps the stored value.
        long_term_goal: Option<String>,
    },
    /// Hand the record to the manager-of-record.
    Submit,
    /// Manager approval.
    Approve,
    /// Send the record back to the employee.
    RequestRevision {
        /// Reason for the revision. Required.
        feedback: Option<String>,
    },
}

impl Command {
    /// Verb used in conflict messages.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::UpdateDraft { .. } => "update",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::RequestRevision { .. } => "request revision of",
        }
    }

    /// Name of the audit action this command records.
    #[must_use]
    pub const fn audit_action(&self) -> &'static str {
        match self {
            Self::UpdateDraft { .. } => "update_target_draft",
            Self::Submit => "submit_targets_to_manager",
            Self::Approve => "approve_targets",
            Self::RequestRevision { .. } => "request_target_revision",
        }
    }
}

/// Input for creating a new target setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTargetSetting {
    /// Identifier to assign to the new record.
    pub id: String,
    /// The employee creating targets for themselves.
    pub employee_id: i64,
    /// The employee's current manager, snapshotted onto the record.
    pub manager_id: Option<i64>,
    /// The appraisal year.
    pub cycle_year: i32,
    /// Initial target list.
    pub targets: Vec<Target>,
    pub current_role: Option<String>,
    pub long_term_goal: Option<String>,
    /// When false the list must already satisfy submission rules.
    pub is_draft: bool,
}
