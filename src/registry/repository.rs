// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Persistence seam for model records
//!
//! The registry owns the invariants; durable storage is delegated to this
//! trait so the host can back it with its own storage layer. Saves carry an
//! expected version for optimistic concurrency: a mismatch means another
//! writer got there first and the registry re-reads and retries.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{EvalError, Result};
use crate::registry::model::Model;

/// Expected version for a compare-and-swap save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The record must not exist yet
    None,
    /// The stored record must have exactly this version
    Exact(u64),
    /// Skip the version check (registry-internal writes under the lock)
    Any,
}

/// Host-implemented storage for model records
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Insert or replace a record if the stored version matches.
    /// Returns `Conflict` on a version mismatch.
    async fn save(&self, model: &Model, expected: ExpectedVersion) -> Result<()>;

    /// Fetch one record by ID
    async fn find(&self, model_id: &str) -> Result<Option<Model>>;

    /// Remove one record by ID; removing a missing record is not an error
    async fn delete(&self, model_id: &str) -> Result<()>;

    /// All records, in unspecified order
    async fn list(&self) -> Result<Vec<Model>>;
}

/// In-memory repository, the default when the host supplies no storage
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<String, Model>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelRepository for InMemoryRepository {
    async fn save(&self, model: &Model, expected: ExpectedVersion) -> Result<()> {
        let mut records = self.records.lock().expect("repository lock");
        let stored_version = records.get(&model.model_id).map(|m| m.version);

        let ok = match expected {
            ExpectedVersion::None => stored_version.is_none(),
            ExpectedVersion::Exact(version) => stored_version == Some(version),
            ExpectedVersion::Any => true,
        };
        if !ok {
            return Err(EvalError::Conflict(format!(
                "stale write for model '{}': stored version {:?}, expected {:?}",
                model.model_id, stored_version, expected
            )));
        }

        records.insert(model.model_id.clone(), model.clone());
        Ok(())
    }

    async fn find(&self, model_id: &str) -> Result<Option<Model>> {
        Ok(self
            .records
            .lock()
            .expect("repository lock")
            .get(model_id)
            .cloned())
    }

    async fn delete(&self, model_id: &str) -> Result<()> {
        self.records.lock().expect("repository lock").remove(model_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Model>> {
        Ok(self
            .records
            .lock()
            .expect("repository lock")
            .values()
            .cloned()
            .collect())
    }
}
