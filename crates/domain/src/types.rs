// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::target_status::TargetSettingStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Difficulty level of a single target.
///
/// The multiplier is applied by downstream scoring, never by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Stretch target.
    L1,
    /// Standard target.
    L2,
    /// Routine target.
    L3,
}

impl Difficulty {
    /// Returns the complexity multiplier for this level.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        match self {
            Self::L1 => 1.25,
            Self::L2 => 1.0,
            Self::L3 => 0.75,
        }
    }

    /// Returns the string representation of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }
}

/// One weighted performance item.
///
/// Every field defaults when absent so that incomplete drafts can be
/// deserialized and saved. Strict validation rejects those gaps at submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Target {
    /// What will be done.
    pub task_description: String,
    /// How success is measured.
    pub kpi: String,
    /// Share of the overall appraisal, in percent.
    pub weight: i64,
    /// Difficulty level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Target {
    /// Creates a complete target.
    #[must_use]
    pub fn new(task_description: &str, kpi: &str, weight: i64, difficulty: Difficulty) -> Self {
        Self {
            task_description: task_description.to_string(),
            kpi: kpi.to_string(),
            weight,
            difficulty: Some(difficulty),
        }
    }

    /// Returns a copy with leading and trailing whitespace removed from the
    /// text fields.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            task_description: self.task_description.trim().to_string(),
            kpi: self.kpi.trim().to_string(),
            weight: self.weight,
            difficulty: self.difficulty,
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `targets[1].kpi`.
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One employee's performance-target package for one appraisal cycle.
///
/// `manager_id` is the employee's manager at creation time and is never
/// re-resolved. Approval rights stay with this manager-of-record for the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSetting {
    /// Opaque unique identifier.
    pub id: String,
    /// The owning employee.
    pub employee_id: i64,
    /// The manager-of-record.
    pub manager_id: i64,
    /// The appraisal year.
    pub cycle_year: i32,
    /// Current workflow status.
    pub status: TargetSettingStatus,
    /// Ordered target list.
    pub targets: Vec<Target>,
    pub current_role: Option<String>,
    pub long_term_goal: Option<String>,
    /// Feedback from the most recent revision request.
    pub manager_feedback: Option<String>,
    pub submitted_at: Option<OffsetDateTime>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// Write counter. Starts at 1 and grows by one on every stored change;
    /// conditional updates match on it.
    pub version: i64,
}

impl TargetSetting {
    /// Returns true if `user_id` is the owning employee.
    #[must_use]
    pub const fn is_owned_by(&self, user_id: i64) -> bool {
        self.employee_id == user_id
    }

    /// Returns true if `user_id` is the manager-of-record.
    #[must_use]
    pub const fn is_managed_by(&self, user_id: i64) -> bool {
        self.manager_id == user_id
    }

    /// Sum of all target weights.
    #[must_use]
    pub fn total_weight(&self) -> i64 {
        self.targets
            .iter()
            .fold(0_i64, |acc, target| acc.saturating_add(target.weight))
    }
}
