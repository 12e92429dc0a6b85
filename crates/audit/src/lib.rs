// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

#[cfg(test)]
mod tests;

/// Entity type recorded for target-setting audit events.
pub const TARGET_SETTING_ENTITY: &str = "target_setting";

/// Represents the entity performing an action.
///
/// An actor is the authenticated user that initiated a state change,
/// together with the role they acted in at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The role the actor held for this action (e.g., "employee", "manager").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The role the actor acted in
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// Represents the reason or trigger for an action.
///
/// A cause describes why a state change was initiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`submit_targets_to_manager`").
    pub name: String,
    /// Optional structured details about the action, as JSON text.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// Identifies the record an action was performed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// The kind of record (e.g., "`target_setting`").
    pub entity_type: String,
    /// The record's identifier.
    pub entity_id: String,
}

impl EntityRef {
    /// Creates a new `EntityRef`.
    #[must_use]
    pub const fn new(entity_type: String, entity_id: String) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }

    /// Creates a reference to a target setting.
    #[must_use]
    pub fn target_setting(id: &str) -> Self {
        Self::new(TARGET_SETTING_ENTITY.to_string(), id.to_string())
    }
}

/// A compact snapshot of record state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// A string representation of the state.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    ///
    /// # Arguments
    ///
    /// * `data` - A string representation of the state
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change produces exactly one audit event.
/// Audit events are never updated or deleted once created, and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - Which record it was performed on (entity)
/// - The state before and after the transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The persisted identifier, `None` until stored.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The record the action targeted.
    pub entity: EntityRef,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
    /// Creation timestamp assigned by storage, `None` until stored.
    pub created_at: Option<String>,
}

impl AuditEvent {
    /// Creates a new, not yet persisted `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `entity` - The record the action targeted
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        entity: EntityRef,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            entity,
            before,
            after,
            created_at: None,
        }
    }

    /// Returns a copy carrying the identifiers assigned by storage.
    #[must_use]
    pub fn with_persisted(mut self, event_id: i64, created_at: String) -> Self {
        self.event_id = Some(event_id);
        self.created_at = Some(created_at);
        self
    }
}
