// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{Command, CreateTargetSetting};
use crate::error::CoreError;
use crate::state::{CreateResult, TransitionResult, snapshot};
use appraisal_audit::{Action, Actor, AuditEvent, Cause, EntityRef, StateSnapshot};
use appraisal_domain::{
    DomainError, Target, TargetSetting, TargetSettingStatus, validate_cycle_year,
    validate_feedback, validate_target_list,
};
use time::OffsetDateTime;

fn transition_details(
    previous: Option<TargetSettingStatus>,
    record: &TargetSetting,
    feedback: Option<&str>,
) -> String {
    let mut details = serde_json::json!({
        "previousStatus": previous.map(|s| s.as_str()),
        "newStatus": record.status.as_str(),
        "targetCount": record.targets.len(),
    });
    if let Some(feedback) = feedback {
        details["feedback"] = serde_json::Value::from(feedback);
    }
    details.to_string()
}

fn validate_strict(targets: &[Target]) -> Result<Vec<Target>, CoreError> {
    validate_target_list(targets)
        .map_err(|errors| CoreError::DomainViolation(DomainError::InvalidTargets { errors }))?;
    Ok(targets.iter().map(Target::trimmed).collect())
}

/// Creates a new target setting in `draft`.
///
/// The caller is responsible for checking that no record exists yet for the
/// same employee and cycle year. The store enforces it regardless.
///
/// # Arguments
///
/// * `command` - The creation input
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The timestamp to record
///
/// # Errors
///
/// Returns an error if:
/// - The cycle year is out of range
/// - The employee has no manager
/// - `is_draft` is false and the target list fails strict validation
pub fn apply_create(
    command: CreateTargetSetting,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<CreateResult, CoreError> {
    validate_cycle_year(command.cycle_year)?;

    let Some(manager_id) = command.manager_id else {
        return Err(CoreError::DomainViolation(DomainError::NoManagerAssigned {
            employee_id: command.employee_id,
        }));
    };

    let targets: Vec<Target> = if command.is_draft {
        command.targets
    } else {
        validate_strict(&command.targets)?
    };

    let new_record: TargetSetting = TargetSetting {
        id: command.id,
        employee_id: command.employee_id,
        manager_id,
        cycle_year: command.cycle_year,
        status: TargetSettingStatus::Draft,
        targets,
        current_role: command.current_role,
        long_term_goal: command.long_term_goal,
        manager_feedback: None,
        submitted_at: None,
        approved_at: None,
        created_at: now,
        updated_at: now,
        version: 1,
    };

    let action: Action = Action::new(
        String::from("create_target_draft"),
        Some(transition_details(None, &new_record, None)),
    );
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        action,
        EntityRef::target_setting(&new_record.id),
        StateSnapshot::new(String::from("none")),
        snapshot(&new_record),
    );

    Ok(CreateResult {
        new_record,
        audit_event,
    })
}

/// Applies a command to an existing target setting.
///
/// This function is pure. It never touches storage and the input record is
/// left unchanged. Relationship checks (owner, manager-of-record) are the
/// caller's concern; this function enforces the lifecycle and content rules.
///
/// # Arguments
///
/// * `record` - The current record
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The timestamp to record
///
/// # Errors
///
/// Returns an error if:
/// - The record's status does not accept the command
/// - Submission finds the stored list invalid
/// - Revision feedback is missing or out of bounds
pub fn apply(
    record: &TargetSetting,
    command: Command,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let to: TargetSettingStatus = match &command {
        Command::UpdateDraft { .. } => TargetSettingStatus::Draft,
        Command::Submit => TargetSettingStatus::SubmittedToManager,
        Command::Approve => TargetSettingStatus::ManagerApproved,
        Command::RequestRevision { .. } => TargetSettingStatus::RevisionRequested,
    };

    if !record.status.can_transition_to(to) {
        return Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition {
                current: record.status,
                action: command.verb().to_string(),
            },
        ));
    }

    let action_name: &'static str = command.audit_action();
    let mut new_record: TargetSetting = record.clone();
    let mut feedback_detail: Option<String> = None;

    match command {
        Command::UpdateDraft {
            targets,
            current_role,
            long_term_goal,
        } => {
            new_record.targets = targets;
            if current_role.is_some() {
                new_record.current_role = current_role;
            }
            if long_term_goal.is_some() {
                new_record.long_term_goal = long_term_goal;
            }
        }
        Command::Submit => {
            new_record.targets = validate_strict(&record.targets)?;
            new_record.submitted_at = Some(now);
        }
        Command::Approve => {
            new_record.approved_at = Some(now);
            new_record.manager_feedback = None;
        }
        Command::RequestRevision { feedback } => {
            let feedback: String = validate_feedback(feedback.as_deref())?;
            new_record.approved_at = None;
            new_record.manager_feedback = Some(feedback.clone());
            feedback_detail = Some(feedback);
        }
    }

    new_record.status = to;
    new_record.updated_at = now;
    new_record.version = record.version.saturating_add(1);

    let action: Action = Action::new(
        action_name.to_string(),
        Some(transition_details(
            Some(record.status),
            &new_record,
            feedback_detail.as_deref(),
        )),
    );
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        action,
        EntityRef::target_setting(&record.id),
        snapshot(record),
        snapshot(&new_record),
    );

    Ok(TransitionResult {
        new_record,
        expected_status: record.status,
        expected_version: record.version,
        audit_event,
    })
}
