use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use hashmodel_core::{KeyScheme, Model};
use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// ModelBinding
// ---------------------------------------------------------------------------

/// What the engine knows about one registered model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinding {
    /// Model name used in storage keys.
    pub name: String,
    /// Rust type bound to the name.
    pub type_name: &'static str,
    /// Key of the model's identifier list.
    pub collection_key: String,
    type_id: TypeId,
}

impl ModelBinding {
    fn of<M: Model>(keys: &KeyScheme) -> Self {
        let name = M::model_name();
        Self {
            collection_key: keys.collection_key(&name),
            name,
            type_name: std::any::type_name::<M>(),
            type_id: TypeId::of::<M>(),
        }
    }

    /// Whether this binding belongs to model type `M`.
    #[must_use]
    pub fn is<M: Model>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }
}

// ---------------------------------------------------------------------------
// ModelRegistry
// ---------------------------------------------------------------------------

/// Registry of the models bound to an engine.
///
/// Provides two lookup mechanisms:
/// - **By name** (`get_by_name`): the model name used in storage keys
/// - **By type** (`get::<M>`): the model's `TypeId`
///
/// Registering is not deduplicated: registering a model again, or another type
/// under the same name, rebinds the name to the latest registration.
#[derive(Default)]
pub struct ModelRegistry {
    /// Name-based lookup: model name -> binding.
    by_name: DashMap<String, Arc<ModelBinding>>,
    /// Type-based lookup: `TypeId` -> model name.
    by_type: DashMap<TypeId, String>,
    /// First-registration order of model names.
    order: RwLock<Vec<String>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds model `M`, returning its binding.
    pub fn register<M: Model>(&self, keys: &KeyScheme) -> Arc<ModelBinding> {
        let binding = Arc::new(ModelBinding::of::<M>(keys));
        let name = binding.name.clone();

        if let Some(previous) = self.by_name.insert(name.clone(), binding.clone()) {
            if previous.type_id == binding.type_id {
                tracing::debug!(model = %name, "model re-registered");
            } else {
                tracing::warn!(
                    model = %name,
                    previous = previous.type_name,
                    current = binding.type_name,
                    "model name rebound to a different type"
                );
                self.by_type.remove(&previous.type_id);
            }
        } else {
            self.order.write().push(name.clone());
            tracing::debug!(model = %name, key = %binding.collection_key, "model registered");
        }
        self.by_type.insert(binding.type_id, name);
        binding
    }

    /// Binding for model type `M`, if registered.
    #[must_use]
    pub fn get<M: Model>(&self) -> Option<Arc<ModelBinding>> {
        let name = self.by_type.get(&TypeId::of::<M>())?.value().clone();
        self.get_by_name(&name)
    }

    /// Binding registered under `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<ModelBinding>> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Registered model names in first-registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Number of registered model names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ModelSet
// ---------------------------------------------------------------------------

/// A tuple of models registered together, `(A,)` through `(A, B, ..., H)`.
pub trait ModelSet {
    /// Registers every model of the set in tuple order.
    fn register_all(registry: &ModelRegistry, keys: &KeyScheme) -> Vec<Arc<ModelBinding>>;
}

macro_rules! impl_model_set {
    ($($model:ident),+) => {
        impl<$($model: Model),+> ModelSet for ($($model,)+) {
            fn register_all(
                registry: &ModelRegistry,
                keys: &KeyScheme,
            ) -> Vec<Arc<ModelBinding>> {
                vec![$(registry.register::<$model>(keys)),+]
            }
        }
    };
}

impl_model_set!(A);
impl_model_set!(A, B);
impl_model_set!(A, B, C);
impl_model_set!(A, B, C, D);
impl_model_set!(A, B, C, D, E);
impl_model_set!(A, B, C, D, E, F);
impl_model_set!(A, B, C, D, E, F, G);
impl_model_set!(A, B, C, D, E, F, G, H);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
