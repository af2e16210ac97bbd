// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! EvalHub - AI model management for evaluation workflows.
//!
//! This crate exposes the shared runtime used by the `evalhub` CLI
//! (`src/main.rs`) and by applications embedding the service directly.
//!
//! Architecture highlights:
//! - `registry`: validated model catalog with a single-default invariant
//! - `templates`: built-in blueprints for common provider configurations
//! - `provider`: invocation abstraction over HTTP backends, with retry
//! - `tester`, `comparator`: bounded concurrent probing and side-by-side runs
//! - `recommender`: deterministic multi-criteria ranking
//! - `monitor`: raw-event metrics with daily aggregation and retention
//! - `service`: facade wiring the components together from `Settings`

pub mod cli;
pub mod comparator;
pub mod config;
pub mod error;
pub mod monitor;
pub mod provider;
pub mod recommender;
pub mod registry;
pub mod service;
pub mod templates;
pub mod tester;

pub use error::{EvalError, Result};
