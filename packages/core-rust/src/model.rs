use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::id::RecordId;

/// A record type persisted as one hash per instance.
///
/// The factory half of a model is its `Deserialize` impl: the engine builds
/// instances from the stored field mapping through [`RecordMapper`]. The
/// identifier is managed by the engine and should be skipped by serde
/// (`#[serde(skip)]`); the mapper writes it under the configured identifier
/// field itself.
///
/// Fields missing from a stored hash are only tolerated if the model says so,
/// typically with a container-level `#[serde(default)]`. Unknown stored fields
/// are dropped unless the model declares a `#[serde(flatten)]` catch-all map.
///
/// [`RecordMapper`]: crate::mapper::RecordMapper
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name used to build this model's storage keys.
    ///
    /// Defaults to the type's own name, lower-cased, without module path or
    /// generic arguments (`app::models::Profile` becomes `profile`). Names must
    /// be unique among the models sharing one engine.
    #[must_use]
    fn model_name() -> String {
        type_model_name::<Self>()
    }

    /// The record's identifier, `None` until first saved.
    fn id(&self) -> Option<&RecordId>;

    /// Stores the identifier assigned on insert or read back from the store.
    fn set_id(&mut self, id: RecordId);
}

/// Derives a model name from a Rust type name.
#[must_use]
pub fn type_model_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Profile {
        #[serde(skip)]
        id: Option<RecordId>,
        title: String,
    }

    impl Model for Profile {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Renamed {
        #[serde(skip)]
        id: Option<RecordId>,
    }

    impl Model for Renamed {
        fn model_name() -> String {
            "accounts".to_string()
        }

        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    struct Wrapper<T>(T);

    #[test]
    fn default_name_is_lowercased_type_name() {
        assert_eq!(Profile::model_name(), "profile");
    }

    #[test]
    fn model_name_can_be_overridden() {
        assert_eq!(Renamed::model_name(), "accounts");
    }

    #[test]
    fn type_model_name_strips_generics() {
        assert_eq!(type_model_name::<Wrapper<Profile>>(), "wrapper");
        assert_eq!(type_model_name::<String>(), "string");
    }

    #[test]
    fn set_id_populates_identifier() {
        let mut profile = Profile::default();
        assert!(profile.id().is_none());

        profile.set_id(RecordId::parse("p-1").unwrap());
        assert_eq!(profile.id().map(RecordId::as_str), Some("p-1"));
    }
}
