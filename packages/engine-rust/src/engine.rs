//! The mapping engine: CRUD over the two-structure storage scheme.
//!
//! Each model owns a collection list (`{prefix}_{model}`) holding record
//! identifiers, newest first, and one hash per record
//! (`{prefix}_{model}#{id}`). The two structures are written with separate
//! requests and are never updated atomically as a pair:
//!
//! - insert: hash-set, then list-push
//! - remove: list-remove, then delete
//!
//! A failure between the two steps leaves them inconsistent. Insert attempts
//! a best-effort cleanup and reports its outcome in
//! [`EngineError::CreateFailed`]; remove does not.

use std::sync::Arc;

use hashmodel_core::{
    Filters, IdGenerator, KeyScheme, Model, RecordId, RecordMapper, TimeOrderedIds,
};

use crate::collection::Collection;
use crate::config::{EngineConfig, DEFAULT_PAGE_SIZE};
use crate::error::{Cleanup, EngineError};
use crate::query::QueryHandle;
use crate::registry::{ModelBinding, ModelRegistry, ModelSet};
use crate::store::{MemoryStore, StoreClient};

/// Outcome of a successful [`Engine::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was inserted under a freshly generated identifier.
    Created(RecordId),
    /// An existing record's hash was overwritten.
    Updated(RecordId),
}

impl SaveOutcome {
    /// Identifier of the saved record.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of [`Engine::remove`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveResult {
    /// Number of record hashes deleted: 0 or 1.
    pub deleted_count: u64,
}

/// Result of [`Engine::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    /// Size of the collection list when the clear started. This is not a
    /// count of hashes actually deleted.
    pub deleted_count: u64,
}

pub(crate) struct EngineInner {
    store: Arc<dyn StoreClient>,
    keys: KeyScheme,
    mapper: RecordMapper,
    ids: Arc<dyn IdGenerator>,
    registry: ModelRegistry,
    config: EngineConfig,
}

/// Object-mapping engine over a hash + list store.
///
/// Owns the store connection and mediates every access to it. Cloning is
/// cheap and clones share the connection and the model registry.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Creates an engine over an already connected store.
    #[must_use]
    pub fn new(config: EngineConfig, store: Arc<dyn StoreClient>) -> Self {
        Self::with_id_generator(config, store, Arc::new(TimeOrderedIds))
    }

    /// Creates an engine that draws new identifiers from `ids`.
    ///
    /// A `page_size` of 0 is replaced by [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn with_id_generator(
        mut config: EngineConfig,
        store: Arc<dyn StoreClient>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        if config.page_size == 0 {
            tracing::warn!(
                default = DEFAULT_PAGE_SIZE,
                "page_size = 0 is not usable; falling back to the default"
            );
            config.page_size = DEFAULT_PAGE_SIZE;
        }
        Self {
            inner: Arc::new(EngineInner {
                store,
                keys: KeyScheme::new(config.prefix.clone()),
                mapper: RecordMapper::new(config.id_field.clone()),
                ids,
                registry: ModelRegistry::new(),
                config,
            }),
        }
    }

    /// Creates an engine over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Connects to the Redis server described by `config.store`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the connection cannot be established.
    #[cfg(feature = "redis")]
    pub async fn connect(config: EngineConfig) -> Result<Self, EngineError> {
        let store = crate::store::RedisStore::connect(&config.store).await?;
        Ok(Self::new(config, Arc::new(store)))
    }

    /// Connects like [`connect`](Self::connect), then registers every model
    /// of the set `S`, e.g. `Engine::connect_with::<(Profile, Article)>(config)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the connection cannot be established.
    #[cfg(feature = "redis")]
    pub async fn connect_with<S: ModelSet>(config: EngineConfig) -> Result<Self, EngineError> {
        let engine = Self::connect(config).await?;
        engine.register_all::<S>();
        Ok(engine)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn keys(&self) -> &KeyScheme {
        &self.inner.keys
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.inner.registry
    }

    pub(crate) fn store(&self) -> &dyn StoreClient {
        self.inner.store.as_ref()
    }

    // --- Registration ---

    /// Registers model `M` and returns its bound operations.
    ///
    /// Registering again rebinds the model name and returns a fresh bundle.
    pub fn register<M: Model>(&self) -> Collection<M> {
        let binding = self.inner.registry.register::<M>(&self.inner.keys);
        Collection::new(self.clone(), binding)
    }

    /// Registers every model of the tuple `S` in order.
    pub fn register_all<S: ModelSet>(&self) -> Vec<Arc<ModelBinding>> {
        S::register_all(&self.inner.registry, &self.inner.keys)
    }

    /// Bound operations of an already registered model `M`.
    #[must_use]
    pub fn collection<M: Model>(&self) -> Option<Collection<M>> {
        let binding = self.inner.registry.get::<M>()?;
        Some(Collection::new(self.clone(), binding))
    }

    // --- CRUD ---

    /// Inserts `record` if it has no identifier, otherwise overwrites its hash.
    ///
    /// On insert the generated identifier is stored into `record` only once
    /// both the hash and the collection list have been written.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Mapping`] if the record cannot be flattened
    /// - [`EngineError::CreateFailed`] if an insert step fails
    /// - [`EngineError::Store`] if an update fails
    pub async fn save<M: Model>(&self, record: &mut M) -> Result<SaveOutcome, EngineError> {
        self.save_as(&M::model_name(), record).await
    }

    pub(crate) async fn save_as<M: Model>(
        &self,
        model: &str,
        record: &mut M,
    ) -> Result<SaveOutcome, EngineError> {
        let mut fields = self.inner.mapper.to_fields(record)?;

        if let Some(id) = record.id().cloned() {
            let key = self.inner.keys.record_key(model, &id);
            self.store().hash_set(&key, &fields).await?;
            tracing::debug!(model = %model, id = %id, "record updated");
            return Ok(SaveOutcome::Updated(id));
        }

        let id = self.inner.ids.next_id();
        fields.insert(self.inner.mapper.id_field().to_string(), id.to_string());
        let record_key = self.inner.keys.record_key(model, &id);

        if let Err(source) = self.store().hash_set(&record_key, &fields).await {
            return Err(EngineError::CreateFailed {
                model: model.to_string(),
                id,
                cleanup: Cleanup::NotAttempted,
                source,
            });
        }

        let collection_key = self.inner.keys.collection_key(model);
        if let Err(source) = self.store().list_push(&collection_key, id.as_str()).await {
            let cleanup = match self.remove_id(model, &id).await {
                Ok(_) => Cleanup::Succeeded,
                Err(err) => {
                    tracing::warn!(
                        model = %model,
                        id = %id,
                        error = %err,
                        "cleanup after failed insert did not complete; record hash may be orphaned"
                    );
                    Cleanup::Failed
                }
            };
            return Err(EngineError::CreateFailed {
                model: model.to_string(),
                id,
                cleanup,
                source,
            });
        }

        record.set_id(id.clone());
        tracing::debug!(model = %model, id = %id, "record created");
        Ok(SaveOutcome::Created(id))
    }

    /// Removes record `id` of model `M`.
    ///
    /// With no identifier this is a no-op that never contacts the store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if either removal step fails. A failure
    /// of the second step leaves the hash in place with no list entry.
    pub async fn remove<M: Model>(&self, id: Option<&RecordId>) -> Result<RemoveResult, EngineError> {
        let Some(id) = id else {
            return Ok(RemoveResult::default());
        };
        self.remove_id(&M::model_name(), id).await
    }

    pub(crate) async fn remove_id(
        &self,
        model: &str,
        id: &RecordId,
    ) -> Result<RemoveResult, EngineError> {
        let collection_key = self.inner.keys.collection_key(model);
        self.store()
            .list_remove(&collection_key, 1, id.as_str())
            .await?;

        let record_key = self.inner.keys.record_key(model, id);
        let deleted_count = self.store().delete(&record_key).await?;
        tracing::debug!(model = %model, id = %id, deleted_count, "record removed");
        Ok(RemoveResult { deleted_count })
    }

    /// Fetches record `id` of model `M`.
    ///
    /// Returns `Ok(None)` if no hash exists for the identifier. A stored hash
    /// lacking the identifier field is given `id`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::GetFailed`] if the store request fails
    /// - [`EngineError::Mapping`] if the model rejects the stored fields
    pub async fn get_by_id<M: Model>(&self, id: &RecordId) -> Result<Option<M>, EngineError> {
        self.get_as(&M::model_name(), id).await
    }

    pub(crate) async fn get_as<M: Model>(
        &self,
        model: &str,
        id: &RecordId,
    ) -> Result<Option<M>, EngineError> {
        let key = self.inner.keys.record_key(model, id);
        let fields = match self.store().hash_get_all(&key).await {
            Ok(fields) => fields,
            Err(source) => {
                return Err(EngineError::GetFailed {
                    model: model.to_string(),
                    id: id.clone(),
                    source,
                })
            }
        };
        if fields.is_empty() {
            return Ok(None);
        }

        let mut record: M = self.inner.mapper.from_fields(fields)?;
        if record.id().is_none() {
            record.set_id(id.clone());
        }
        Ok(Some(record))
    }

    // --- Queries ---

    /// Opens a query over every record of model `M`.
    ///
    /// `filters` are accepted but not applied. The collection size is read
    /// once, here, and frozen in the returned handle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the list length cannot be read.
    pub async fn find<M: Model>(&self, filters: &Filters) -> Result<QueryHandle<M>, EngineError> {
        self.find_as(&M::model_name(), filters).await
    }

    pub(crate) async fn find_as<M: Model>(
        &self,
        model: &str,
        filters: &Filters,
    ) -> Result<QueryHandle<M>, EngineError> {
        if !filters.is_empty() {
            tracing::debug!(
                model = %model,
                filters = filters.len(),
                "filters are not applied; query covers all records"
            );
        }
        let key = self.inner.keys.collection_key(model);
        let count = self.store().list_len(&key).await?;
        Ok(QueryHandle::new(self.clone(), model.to_string(), key, count))
    }

    /// Removes every record of model `M`.
    ///
    /// Identifiers are enumerated page by page first, then removed one by one,
    /// so pages never shift under the enumeration. The returned count is the
    /// collection size when the clear started.
    ///
    /// # Errors
    ///
    /// Returns the first error from enumeration or removal; records removed
    /// before the failure stay removed.
    pub async fn clear<M: Model>(&self, filters: &Filters) -> Result<ClearResult, EngineError> {
        self.clear_as::<M>(&M::model_name(), filters).await
    }

    pub(crate) async fn clear_as<M: Model>(
        &self,
        model: &str,
        filters: &Filters,
    ) -> Result<ClearResult, EngineError> {
        let query = self.find_as::<M>(model, filters).await?;
        let ids = query.snapshot_ids(self.inner.config.page_size).await?;

        for id in &ids {
            let removed = self.remove_id(query.model(), id).await?;
            if removed.deleted_count == 0 {
                tracing::warn!(
                    model = %query.model(),
                    id = %id,
                    "collection list referenced a record with no hash"
                );
            }
        }

        tracing::debug!(model = %query.model(), count = query.count(), "collection cleared");
        Ok(ClearResult {
            deleted_count: query.count(),
        })
    }
}
