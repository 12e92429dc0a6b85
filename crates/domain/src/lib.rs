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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod target_status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use target_status::TargetSettingStatus;
pub use types::{Difficulty, FieldError, Target, TargetSetting};
pub use validation::{
    FEEDBACK_LENGTH, KPI_LENGTH, MAX_CYCLE_YEAR, MAX_TARGETS, MIN_CYCLE_YEAR, MIN_TARGETS,
    REQUIRED_WEIGHT_TOTAL, TASK_DESCRIPTION_LENGTH, WEIGHT_RANGE, validate_cycle_year,
    validate_draft_entries, validate_feedback, validate_target, validate_target_list,
};
