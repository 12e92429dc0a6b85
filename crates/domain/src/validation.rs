// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Target validation.
//!
//! Two levels exist on purpose. Submission uses the strict checks
//! (`validate_target_list`); draft saves use `validate_draft_entries`, which
//! only requires object-shaped entries so unfinished work can be stored.

use crate::error::DomainError;
use crate::types::{Difficulty, FieldError, Target};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;

/// Fewest targets a submitted list may contain.
pub const MIN_TARGETS: usize = 3;
/// Most targets a submitted list may contain.
pub const MAX_TARGETS: usize = 5;
/// Required weight total of a submitted list.
pub const REQUIRED_WEIGHT_TOTAL: i64 = 100;
/// Accepted task description length, in characters after trimming.
pub const TASK_DESCRIPTION_LENGTH: RangeInclusive<usize> = 10..=500;
/// Accepted KPI length, in characters after trimming.
pub const KPI_LENGTH: RangeInclusive<usize> = 5..=200;
/// Accepted weight of a single target.
pub const WEIGHT_RANGE: RangeInclusive<i64> = 1..=100;
/// Accepted revision feedback length, in characters after trimming.
pub const FEEDBACK_LENGTH: RangeInclusive<usize> = 10..=1000;
/// Earliest accepted cycle year.
pub const MIN_CYCLE_YEAR: i32 = 2000;
/// Latest accepted cycle year.
pub const MAX_CYCLE_YEAR: i32 = 2100;

fn check_length(
    errors: &mut Vec<FieldError>,
    field: String,
    label: &str,
    value: &str,
    bounds: &RangeInclusive<usize>,
) {
    let len: usize = value.trim().chars().count();
    if !bounds.contains(&len) {
        errors.push(FieldError::new(
            field,
            format!(
                "{label} must be between {} and {} characters, got {len}",
                bounds.start(),
                bounds.end()
            ),
        ));
    }
}

fn collect_target_errors(target: &Target, prefix: &str) -> Vec<FieldError> {
    let mut errors: Vec<FieldError> = Vec::new();

    check_length(
        &mut errors,
        format!("{prefix}taskDescription"),
        "Task description",
        &target.task_description,
        &TASK_DESCRIPTION_LENGTH,
    );
    check_length(&mut errors, format!("{prefix}kpi"), "KPI", &target.kpi, &KPI_LENGTH);

    if !WEIGHT_RANGE.contains(&target.weight) {
        errors.push(FieldError::new(
            format!("{prefix}weight"),
            format!(
                "Weight must be between {} and {}, got {}",
                WEIGHT_RANGE.start(),
                WEIGHT_RANGE.end(),
                target.weight
            ),
        ));
    }

    if target.difficulty.is_none() {
        errors.push(FieldError::new(
            format!("{prefix}difficulty"),
            "Difficulty must be one of L1, L2, L3",
        ));
    }

    errors
}

/// Validates the per-field bounds of a single target.
///
/// Text fields are trimmed before their length is measured.
///
/// # Errors
///
/// Returns every field that violates its bound:
/// - task description outside 10–500 characters
/// - KPI outside 5–200 characters
/// - weight outside 1–100
/// - missing difficulty
pub fn validate_target(target: &Target) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = collect_target_errors(target, "");
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a target list for submission.
///
/// Enforces the count bounds and the exact weight total, in addition to
/// validating every item.
///
/// # Errors
///
/// Returns every violation found, with item fields prefixed by their
/// position (e.g. `targets[2].weight`).
pub fn validate_target_list(targets: &[Target]) -> Result<(), Vec<FieldError>> {
    let mut errors: Vec<FieldError> = Vec::new();

    if !(MIN_TARGETS..=MAX_TARGETS).contains(&targets.len()) {
        errors.push(FieldError::new(
            "targets",
            format!(
                "Between {MIN_TARGETS} and {MAX_TARGETS} targets are required, got {}",
                targets.len()
            ),
        ));
    }

    let total: i64 = targets
        .iter()
        .fold(0_i64, |acc, target| acc.saturating_add(target.weight));
    if total != REQUIRED_WEIGHT_TOTAL {
        errors.push(FieldError::new(
            "targets",
            format!("Target weights must sum to exactly {REQUIRED_WEIGHT_TOTAL}, got {total}"),
        ));
    }

    for (index, target) in targets.iter().enumerate() {
        errors.extend(collect_target_errors(target, &format!("targets[{index}].")));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Reads one draft entry, falling back to the empty value for any field that
/// is missing, null, blank, or of the wrong type.
fn read_draft_entry(entry: &Map<String, Value>) -> Target {
    let text = |key: &str| -> String {
        entry
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let weight: i64 = match entry.get("weight") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    };

    let difficulty: Option<Difficulty> = entry
        .get("difficulty")
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    Target {
        task_description: text("taskDescription"),
        kpi: text("kpi"),
        weight,
        difficulty,
    }
}

/// Validates a draft target list.
///
/// Only checks that every entry is an object. Unreadable field values are
/// stored as empty ones, and count and weight total are not enforced;
/// submission applies the strict checks to whatever was saved.
///
/// # Errors
///
/// Returns one error per entry that is not an object.
pub fn validate_draft_entries(entries: &[Value]) -> Result<Vec<Target>, Vec<FieldError>> {
    let mut targets: Vec<Target> = Vec::with_capacity(entries.len());
    let mut errors: Vec<FieldError> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(fields) => targets.push(read_draft_entry(fields)),
            None => errors.push(FieldError::new(
                format!("targets[{index}]"),
                "Each target must be an object",
            )),
        }
    }

    if errors.is_empty() {
        Ok(targets)
    } else {
        Err(errors)
    }
}

/// Validates revision feedback and returns it trimmed.
///
/// # Errors
///
/// Returns an error if the feedback is missing or its trimmed length is
/// outside 10–1000 characters.
pub fn validate_feedback(feedback: Option<&str>) -> Result<String, DomainError> {
    let Some(feedback) = feedback else {
        return Err(DomainError::InvalidFeedback(String::from(
            "Feedback is required when requesting a revision",
        )));
    };

    let trimmed: &str = feedback.trim();
    let len: usize = trimmed.chars().count();
    if !FEEDBACK_LENGTH.contains(&len) {
        return Err(DomainError::InvalidFeedback(format!(
            "Feedback must be between {} and {} characters, got {len}",
            FEEDBACK_LENGTH.start(),
            FEEDBACK_LENGTH.end()
        )));
    }

    Ok(trimmed.to_string())
}

/// Validates that a cycle year is a plausible appraisal year.
///
/// # Errors
///
/// Returns an error if the year is outside 2000–2100.
pub fn validate_cycle_year(year: i32) -> Result<(), DomainError> {
    if !(MIN_CYCLE_YEAR..=MAX_CYCLE_YEAR).contains(&year) {
        return Err(DomainError::InvalidCycleYear(format!(
            "Cycle year must be between {MIN_CYCLE_YEAR} and {MAX_CYCLE_YEAR}, got {year}"
        )));
    }
    Ok(())
}
