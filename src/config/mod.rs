// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Configuration module
//!
//! Handles loading and saving settings from ~/.evalhub/settings.json.

pub mod settings;

pub use settings::*;
