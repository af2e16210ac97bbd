// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Model registry
//!
//! Source of truth for model metadata. Enforces ID uniqueness and the
//! single-default invariant, and delegates persistence to a repository
//! trait implemented by the host's storage layer.

pub mod model;
pub mod repository;
pub mod store;

pub use model::*;
pub use repository::{InMemoryRepository, ModelRepository};
pub use store::ModelRegistry;
