// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only query modules.
//!
//! - `audit`: audit trail retrieval
//! - `target_settings`: target-setting lookups and scoped listings
//! - `users`: user directory and session lookups

pub mod audit;
pub mod target_settings;
pub mod users;
