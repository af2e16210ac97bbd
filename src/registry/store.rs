// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Registry store: mutations, invariants, and filtered reads
//!
//! Mutations run as single critical sections behind one per-registry lock,
//! so the single-default invariant and delete protection are evaluated and
//! enacted without another mutation interleaving. Saves still carry a
//! version check because the repository may be shared with other writers;
//! losing that race is retried a bounded number of times before surfacing
//! a conflict.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{EvalError, Result};
use crate::registry::model::{Model, ModelFilter, ModelPatch, NewModel};
use crate::registry::repository::{ExpectedVersion, InMemoryRepository, ModelRepository};

/// Internal retry budget for repository version conflicts
const MAX_MUTATION_RETRIES: u32 = 3;

/// CRUD store of model records. Constructed once per process (or per
/// tenant) and passed by handle to every component; never a global.
pub struct ModelRegistry {
    repository: Arc<dyn ModelRepository>,
    mutation_lock: Mutex<()>,
}

impl ModelRegistry {
    /// Create a registry over the given repository
    pub fn new(repository: Arc<dyn ModelRepository>) -> Self {
        Self {
            repository,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Create a registry backed by in-process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Register a new model. The record is inserted with `Active` status;
    /// when `is_default` is requested, the previous default is demoted in
    /// the same critical section.
    pub async fn create(&self, new_model: NewModel) -> Result<Model> {
        new_model.validate()?;
        let _guard = self.mutation_lock.lock().await;

        let mut attempt = 0;
        loop {
            match self.try_create(&new_model).await {
                Err(EvalError::Conflict(reason)) if attempt < MAX_MUTATION_RETRIES => {
                    attempt += 1;
                    tracing::debug!(model_id = %new_model.model_id, attempt, %reason, "retrying create after conflict");
                }
                other => return other,
            }
        }
    }

    async fn try_create(&self, new_model: &NewModel) -> Result<Model> {
        if self.repository.find(&new_model.model_id).await?.is_some() {
            return Err(EvalError::Validation(format!(
                "model ID '{}' is already registered",
                new_model.model_id
            )));
        }

        let demoted = if new_model.is_default {
            self.demote_current_default().await?
        } else {
            None
        };

        let model = new_model.clone().into_model(Utc::now());
        if let Err(error) = self.repository.save(&model, ExpectedVersion::None).await {
            if let Some(previous) = demoted {
                self.restore_default(previous).await;
            }
            return Err(error);
        }
        tracing::info!(model_id = %model.model_id, provider = %model.provider, is_default = model.is_default, "model registered");
        Ok(model)
    }

    /// Patch an existing model. `model_id` and `provider` are immutable.
    /// Demoting the default directly is rejected; promote a successor with
    /// `set_default` or an `is_default = true` patch instead.
    pub async fn update(&self, model_id: &str, patch: ModelPatch) -> Result<Model> {
        let _guard = self.mutation_lock.lock().await;

        let mut attempt = 0;
        loop {
            match self.try_update(model_id, &patch).await {
                Err(EvalError::Conflict(reason)) if attempt < MAX_MUTATION_RETRIES => {
                    attempt += 1;
                    tracing::debug!(model_id, attempt, %reason, "retrying update after conflict");
                }
                other => return other,
            }
        }
    }

    async fn try_update(&self, model_id: &str, patch: &ModelPatch) -> Result<Model> {
        let mut model = self
            .repository
            .find(model_id)
            .await?
            .ok_or_else(|| EvalError::model_not_found(model_id))?;

        if patch.is_default == Some(false) && model.is_default {
            return Err(EvalError::Validation(
                "cannot demote the default model without assigning a successor; \
                 promote another model instead"
                    .to_string(),
            ));
        }
        let promoting = patch.is_default == Some(true) && !model.is_default;

        let previous_version = model.version;
        patch.apply_to(&mut model, Utc::now())?;
        model.version = previous_version + 1;

        let demoted = if promoting {
            model.is_default = true;
            self.demote_current_default().await?
        } else {
            None
        };

        if let Err(error) = self
            .repository
            .save(&model, ExpectedVersion::Exact(previous_version))
            .await
        {
            if let Some(previous) = demoted {
                self.restore_default(previous).await;
            }
            return Err(error);
        }
        Ok(model)
    }

    /// Remove a model. The is-default check and the removal share the
    /// mutation lock, so a concurrent promotion cannot slip in between.
    pub async fn delete(&self, model_id: &str) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;

        let model = self
            .repository
            .find(model_id)
            .await?
            .ok_or_else(|| EvalError::model_not_found(model_id))?;

        if model.is_default {
            return Err(EvalError::Forbidden(
                "cannot delete default model".to_string(),
            ));
        }

        self.repository.delete(model_id).await?;
        tracing::info!(model_id, "model deleted");
        Ok(())
    }

    /// Promote a model to registry-wide default, demoting the previous
    /// default in the same critical section.
    pub async fn set_default(&self, model_id: &str) -> Result<Model> {
        let _guard = self.mutation_lock.lock().await;

        let mut attempt = 0;
        loop {
            match self.try_set_default(model_id).await {
                Err(EvalError::Conflict(reason)) if attempt < MAX_MUTATION_RETRIES => {
                    attempt += 1;
                    tracing::debug!(model_id, attempt, %reason, "retrying set_default after conflict");
                }
                other => return other,
            }
        }
    }

    async fn try_set_default(&self, model_id: &str) -> Result<Model> {
        let mut model = self
            .repository
            .find(model_id)
            .await?
            .ok_or_else(|| EvalError::model_not_found(model_id))?;

        if model.is_default {
            return Ok(model);
        }

        let demoted = self.demote_current_default().await?;

        let previous_version = model.version;
        model.is_default = true;
        model.version = previous_version + 1;
        model.updated_at = Utc::now();
        if let Err(error) = self
            .repository
            .save(&model, ExpectedVersion::Exact(previous_version))
            .await
        {
            if let Some(previous) = demoted {
                self.restore_default(previous).await;
            }
            return Err(error);
        }
        tracing::info!(model_id, "default model changed");
        Ok(model)
    }

    /// Fetch one model by ID
    pub async fn get(&self, model_id: &str) -> Result<Model> {
        self.repository
            .find(model_id)
            .await?
            .ok_or_else(|| EvalError::model_not_found(model_id))
    }

    /// All models passing the filter, ordered by model ID
    pub async fn list(&self, filter: Option<&ModelFilter>) -> Result<Vec<Model>> {
        let mut models = self.repository.list().await?;
        if let Some(filter) = filter {
            models.retain(|m| filter.matches(m));
        }
        models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        Ok(models)
    }

    /// The current default model, if any
    pub async fn default_model(&self) -> Result<Option<Model>> {
        Ok(self
            .repository
            .list()
            .await?
            .into_iter()
            .find(|m| m.is_default))
    }

    /// Demote the current default, if any, and return its demoted record
    /// so the caller can roll back with [`Self::restore_default`] if the
    /// follow-up promotion fails. Caller must hold the mutation lock.
    async fn demote_current_default(&self) -> Result<Option<Model>> {
        let current = self
            .repository
            .list()
            .await?
            .into_iter()
            .find(|m| m.is_default);

        if let Some(mut previous) = current {
            let previous_version = previous.version;
            previous.is_default = false;
            previous.version = previous_version + 1;
            previous.updated_at = Utc::now();
            self.repository
                .save(&previous, ExpectedVersion::Exact(previous_version))
                .await?;
            return Ok(Some(previous));
        }
        Ok(None)
    }

    /// Re-promote a model demoted earlier in the same critical section.
    /// Best effort; the original failure is the one surfaced to the
    /// caller, so a failed rollback is only logged.
    async fn restore_default(&self, mut model: Model) {
        let previous_version = model.version;
        model.is_default = true;
        model.version = previous_version + 1;
        model.updated_at = Utc::now();
        if let Err(error) = self
            .repository
            .save(&model, ExpectedVersion::Exact(previous_version))
            .await
        {
            tracing::error!(model_id = %model.model_id, %error, "failed to restore previous default after aborted promotion");
        }
    }
}
