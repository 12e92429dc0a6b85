// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations for the persistence layer.
//!
//! - `audit`: audit event persistence (append-only)
//! - `target_settings`: record creation and conditional updates
//! - `users`: user directory and session mutations

pub mod audit;
pub mod target_settings;
pub mod users;
