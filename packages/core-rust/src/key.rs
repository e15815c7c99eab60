//! Storage key derivation.
//!
//! Every model owns two kinds of keys under a shared prefix:
//!
//! - `{prefix}_{model}`: the list of record identifiers (the collection list)
//! - `{prefix}_{model}#{id}`: the hash holding one record's fields

use crate::id::RecordId;

/// Separator between the prefix and the model name.
pub const PREFIX_SEPARATOR: char = '_';

/// Separator between the collection key and a record identifier.
pub const RECORD_SEPARATOR: char = '#';

/// Pure, deterministic mapping from model identity to storage keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: String,
}

impl KeyScheme {
    /// Creates a key scheme rooted at `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix shared by every key this scheme produces.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the identifier list for `model`.
    #[must_use]
    pub fn collection_key(&self, model: &str) -> String {
        format!("{}{PREFIX_SEPARATOR}{model}", self.prefix)
    }

    /// Key of the hash storing the record `id` of `model`.
    ///
    /// `RecordId` is never empty, so a record key is always distinct from the
    /// collection key.
    #[must_use]
    pub fn record_key(&self, model: &str, id: &RecordId) -> String {
        format!(
            "{}{PREFIX_SEPARATOR}{model}{RECORD_SEPARATOR}{id}",
            self.prefix
        )
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self::new("db")
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn default_prefix_is_db() {
        let keys = KeyScheme::default();
        assert_eq!(keys.collection_key("profile"), "db_profile");
    }

    #[test]
    fn record_key_appends_hash_and_id() {
        let keys = KeyScheme::new("app");
        let id = RecordId::parse("0190-abc").unwrap();
        assert_eq!(keys.record_key("profile", &id), "app_profile#0190-abc");
    }

    #[test]
    fn record_key_differs_from_collection_key() {
        let keys = KeyScheme::new("db");
        let id = RecordId::generate();
        assert_ne!(keys.record_key("user", &id), keys.collection_key("user"));
    }

    proptest! {
        #[test]
        fn keys_are_deterministic(model in "[a-z]{1,12}", raw_id in "[a-z0-9-]{1,36}") {
            let keys = KeyScheme::new("db");
            let id = RecordId::parse(raw_id).unwrap();
            prop_assert_eq!(keys.collection_key(&model), keys.collection_key(&model));
            prop_assert_eq!(keys.record_key(&model, &id), keys.record_key(&model, &id));
        }

        #[test]
        fn distinct_models_never_share_keys(
            a in "[a-z]{1,12}",
            b in "[a-z]{1,12}",
            raw_id in "[a-z0-9-]{1,36}",
        ) {
            prop_assume!(a != b);
            let keys = KeyScheme::new("db");
            let id = RecordId::parse(raw_id).unwrap();
            prop_assert_ne!(keys.collection_key(&a), keys.collection_key(&b));
            prop_assert_ne!(keys.record_key(&a, &id), keys.record_key(&b, &id));
            prop_assert_ne!(keys.record_key(&a, &id), keys.collection_key(&b));
        }
    }
}
