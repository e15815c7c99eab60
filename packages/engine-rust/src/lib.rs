//! `hashmodel`: async object mapping over hash + list key-value stores.
//!
//! Records of a model live in one hash each, and an identifier list per model
//! tracks which records exist. [`Engine`] owns the store connection and
//! exposes CRUD plus paged enumeration; [`Engine::register`] binds a model and
//! returns its [`Collection`].

pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod query;
pub mod registry;
pub mod store;

#[cfg(test)]
mod testing;

pub use collection::Collection;
pub use config::{EngineConfig, StoreConfig, DEFAULT_PAGE_SIZE};
pub use engine::{ClearResult, Engine, RemoveResult, SaveOutcome};
pub use error::{Cleanup, EngineError};
pub use query::{QueryHandle, RecordStream};
pub use registry::{ModelBinding, ModelRegistry, ModelSet};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{FaultyStore, MemoryStore, StoreClient, StoreOp};

pub use hashmodel_core::{
    Fields, Filters, IdGenerator, KeyScheme, MapError, Model, RecordId, RecordMapper,
    TimeOrderedIds,
};
