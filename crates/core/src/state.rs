// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_audit::{AuditEvent, StateSnapshot};
use appraisal_domain::{TargetSetting, TargetSettingStatus};

/// The result of creating a target setting.
#[derive(Debug, Clone)]
pub struct CreateResult {
    /// The record to insert.
    pub new_record: TargetSetting,
    /// The audit event describing the creation.
    pub audit_event: AuditEvent,
}

/// The result of a successful state transition.
///
/// The caller must persist `new_record` conditionally on the stored record
/// still having `expected_status` and `expected_version`. Otherwise another
/// write landed in between and this transition was computed from stale data.
#[derive(Debug, Clone)]
pub struct TransitionResult {
    /// The record after the transition.
    pub new_record: TargetSetting,
    /// The status the transition was computed from.
    pub expected_status: TargetSettingStatus,
    /// The version the transition was computed from.
    pub expected_version: i64,
    /// The audit event describing the transition.
    pub audit_event: AuditEvent,
}

/// Builds the compact audit snapshot of a record.
#[must_use]
pub fn snapshot(record: &TargetSetting) -> StateSnapshot {
    StateSnapshot::new(format!(
        "status={},targets={},total_weight={}",
        record.status,
        record.targets.len(),
        record.total_weight()
    ))
}
