use std::marker::PhantomData;
use std::sync::Arc;

use hashmodel_core::{Filters, Model, RecordId};

use crate::engine::{Engine, SaveOutcome};
use crate::error::EngineError;
use crate::query::{QueryHandle, RecordStream};
use crate::registry::ModelBinding;

/// Operations bound to one registered model.
///
/// Returned by [`Engine::register`]. Type-level operations (`get`, `find`,
/// `clear`) take identifiers or filters; instance-level ones (`save`,
/// `remove`) take a record. Every operation addresses the storage keys of the
/// binding's model name.
pub struct Collection<M> {
    engine: Engine,
    binding: Arc<ModelBinding>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Clone for Collection<M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            binding: self.binding.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> Collection<M> {
    pub(crate) fn new(engine: Engine, binding: Arc<ModelBinding>) -> Self {
        Self {
            engine,
            binding,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.binding.name
    }

    #[must_use]
    pub fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    /// Fetches the record with identifier `id`.
    ///
    /// # Errors
    ///
    /// See [`Engine::get_by_id`].
    pub async fn get(&self, id: &RecordId) -> Result<Option<M>, EngineError> {
        self.engine.get_as(&self.binding.name, id).await
    }

    /// Opens a query over every record of the model.
    ///
    /// # Errors
    ///
    /// See [`Engine::find`].
    pub async fn find(&self, filters: &Filters) -> Result<QueryHandle<M>, EngineError> {
        self.engine.find_as(&self.binding.name, filters).await
    }

    /// Current number of records in the collection list.
    ///
    /// # Errors
    ///
    /// See [`Engine::find`].
    pub async fn count(&self) -> Result<u64, EngineError> {
        Ok(self.find(&Filters::all()).await?.count())
    }

    /// Streams every record using the configured page size.
    ///
    /// # Errors
    ///
    /// See [`Engine::find`] and [`QueryHandle::each`].
    pub async fn each(&self) -> Result<RecordStream<M>, EngineError> {
        self.find(&Filters::all())
            .await?
            .each(self.engine.config().page_size)
    }

    /// Removes every record; `true` if the collection was non-empty.
    ///
    /// # Errors
    ///
    /// See [`Engine::clear`].
    pub async fn clear(&self, filters: &Filters) -> Result<bool, EngineError> {
        Ok(self
            .engine
            .clear_as::<M>(&self.binding.name, filters)
            .await?
            .deleted_count
            > 0)
    }

    /// Inserts or updates `record`, assigning its identifier on insert.
    ///
    /// # Errors
    ///
    /// See [`Engine::save`].
    pub async fn save(&self, record: &mut M) -> Result<SaveOutcome, EngineError> {
        self.engine.save_as(&self.binding.name, record).await
    }

    /// Removes `record`; `true` if exactly one record hash was deleted.
    ///
    /// An unsaved record is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// See [`Engine::remove`].
    pub async fn remove(&self, record: &M) -> Result<bool, EngineError> {
        let Some(id) = record.id() else {
            return Ok(false);
        };
        Ok(self.engine.remove_id(&self.binding.name, id).await?.deleted_count == 1)
    }
}
