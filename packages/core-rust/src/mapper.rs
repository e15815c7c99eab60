//! Conversion between model instances and flat hash payloads.
//!
//! A record hash only holds string values, so [`RecordMapper`] flattens a
//! model's serde representation with these rules:
//!
//! | serde value        | stored as                        |
//! |--------------------|----------------------------------|
//! | string             | verbatim                         |
//! | number, boolean    | display form (`42`, `true`)      |
//! | null               | omitted                          |
//! | array, map         | rejected with [`MapError::Nested`] |
//!
//! Everything read back is a string. Models with numeric or boolean fields
//! must accept string input; [`as_string`] does that for any `FromStr` type.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::id::RecordId;
use crate::model::Model;

/// Flat field/value mapping stored in a record hash.
///
/// `BTreeMap` keeps field order deterministic.
pub type Fields = BTreeMap<String, String>;

/// Default name of the identifier field inside a record hash.
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Errors from mapping records to and from [`Fields`].
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("record of model `{model}` does not serialize to a field map")]
    NotAnObject { model: String },
    #[error("field `{field}` of model `{model}` is nested and cannot be stored in a flat hash")]
    Nested { model: String, field: String },
    #[error("failed to encode record of model `{model}`: {source}")]
    Encode {
        model: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode record of model `{model}`: {source}")]
    Decode {
        model: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Flattens records into [`Fields`] and rebuilds them through the model's
/// `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMapper {
    id_field: String,
}

impl RecordMapper {
    /// Creates a mapper that stores identifiers under `id_field`.
    #[must_use]
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
        }
    }

    /// Name of the hash field holding the record identifier.
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Flattens `record` into a hash payload.
    ///
    /// The identifier, when present, is written under the identifier field and
    /// takes precedence over any serialized field of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the record does not serialize to a map or holds
    /// a nested array or map.
    pub fn to_fields<M: Model>(&self, record: &M) -> Result<Fields, MapError> {
        let value = serde_json::to_value(record).map_err(|source| MapError::Encode {
            model: M::model_name(),
            source,
        })?;
        let Value::Object(object) = value else {
            return Err(MapError::NotAnObject {
                model: M::model_name(),
            });
        };

        let mut fields = Fields::new();
        for (name, value) in object {
            if name == self.id_field {
                continue;
            }
            match value {
                Value::Null => {}
                Value::String(s) => {
                    fields.insert(name, s);
                }
                Value::Bool(b) => {
                    fields.insert(name, b.to_string());
                }
                Value::Number(n) => {
                    fields.insert(name, n.to_string());
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(MapError::Nested {
                        model: M::model_name(),
                        field: name,
                    });
                }
            }
        }

        if let Some(id) = record.id() {
            fields.insert(self.id_field.clone(), id.to_string());
        }
        Ok(fields)
    }

    /// Rebuilds a record from a hash payload.
    ///
    /// An empty or missing identifier field leaves the record without an
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Decode`] if the model's `Deserialize` impl rejects
    /// the remaining fields.
    pub fn from_fields<M: Model>(&self, mut fields: Fields) -> Result<M, MapError> {
        let id = fields
            .remove(&self.id_field)
            .and_then(|raw| RecordId::parse(raw).ok());

        let object: Map<String, Value> = fields
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();

        let mut record: M =
            serde_json::from_value(Value::Object(object)).map_err(|source| MapError::Decode {
                model: M::model_name(),
                source,
            })?;
        if let Some(id) = id {
            record.set_id(id);
        }
        Ok(record)
    }
}

impl Default for RecordMapper {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

/// Serde adapter for non-string fields that must survive a trip through a
/// record hash.
///
/// ```ignore
/// #[serde(with = "hashmodel_core::mapper::as_string")]
/// age: u32,
/// ```
pub mod as_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes through `Display`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Parses the stored string through `FromStr`.
    ///
    /// # Errors
    ///
    /// Fails if the stored value is not a string or does not parse.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Profile {
        #[serde(skip)]
        id: Option<RecordId>,
        title: String,
        email: String,
        password: String,
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
    #[serde(default)]
    struct Counter {
        #[serde(skip)]
        id: Option<RecordId>,
        #[serde(with = "as_string")]
        hits: u64,
        #[serde(with = "as_string")]
        active: bool,
        note: Option<String>,
        #[serde(flatten)]
        extra: Fields,
    }

    impl Model for Counter {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Tagged {
        #[serde(skip)]
        id: Option<RecordId>,
        tags: Vec<String>,
    }

    impl Model for Tagged {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Loose {
        #[serde(skip)]
        id: Option<RecordId>,
        age: u32,
        verified: bool,
    }

    impl Model for Loose {
        fn id(&self) -> Option<&RecordId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    fn profile() -> Profile {
        Profile {
            id: None,
            title: "Alex".to_string(),
            email: "test@test.ru".to_string(),
            password: "testingpas".to_string(),
        }
    }

    #[test]
    fn unsaved_record_has_no_id_field() {
        let fields = RecordMapper::default().to_fields(&profile()).unwrap();
        assert_eq!(fields.len(), 3);
        assert!(!fields.contains_key("_id"));
        assert_eq!(fields["title"], "Alex");
    }

    #[test]
    fn id_is_written_under_configured_field() {
        let mut record = profile();
        record.set_id(RecordId::parse("abc").unwrap());

        let fields = RecordMapper::new("uid").to_fields(&record).unwrap();
        assert_eq!(fields["uid"], "abc");
        assert!(!fields.contains_key("_id"));
    }

    #[test]
    fn string_fields_round_trip() {
        let mapper = RecordMapper::default();
        let mut record = profile();
        record.set_id(RecordId::parse("abc").unwrap());

        let back: Profile = mapper.from_fields(mapper.to_fields(&record).unwrap()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_mapping_yields_default_record_without_id() {
        let back: Profile = RecordMapper::default().from_fields(Fields::new()).unwrap();
        assert!(back.id().is_none());
        assert_eq!(back.title, "");
    }

    #[test]
    fn empty_id_value_is_treated_as_absent() {
        let mut fields = Fields::new();
        fields.insert("_id".to_string(), String::new());
        fields.insert("title".to_string(), "x".to_string());

        let back: Profile = RecordMapper::default().from_fields(fields).unwrap();
        assert!(back.id().is_none());
        assert_eq!(back.title, "x");
    }

    #[test]
    fn numbers_and_bools_use_display_form() {
        let record = Counter {
            hits: 42,
            active: true,
            ..Counter::default()
        };
        let fields = RecordMapper::default().to_fields(&record).unwrap();
        assert_eq!(fields["hits"], "42");
        assert_eq!(fields["active"], "true");
    }

    #[test]
    fn none_fields_are_omitted() {
        let fields = RecordMapper::default().to_fields(&Counter::default()).unwrap();
        assert!(!fields.contains_key("note"));
    }

    #[test]
    fn plain_numeric_fields_serialize_but_read_back_as_strings() {
        let mapper = RecordMapper::default();
        let record = Loose {
            id: None,
            age: 30,
            verified: true,
        };
        let fields = mapper.to_fields(&record).unwrap();
        assert_eq!(fields["age"], "30");
        assert_eq!(fields["verified"], "true");

        let err = mapper.from_fields::<Loose>(fields).unwrap_err();
        assert!(matches!(err, MapError::Decode { .. }));
    }

    #[test]
    fn as_string_fields_round_trip() {
        let mapper = RecordMapper::default();
        let record = Counter {
            hits: 7,
            active: false,
            note: Some("n".to_string()),
            ..Counter::default()
        };
        let back: Counter = mapper.from_fields(mapper.to_fields(&record).unwrap()).unwrap();
        assert_eq!(back.hits, 7);
        assert!(!back.active);
        assert_eq!(back.note.as_deref(), Some("n"));
    }

    #[test]
    fn unknown_fields_are_retained_by_flatten() {
        let mut fields = Fields::new();
        fields.insert("hits".to_string(), "1".to_string());
        fields.insert("active".to_string(), "true".to_string());
        fields.insert("legacy".to_string(), "kept".to_string());

        let mapper = RecordMapper::default();
        let back: Counter = mapper.from_fields(fields).unwrap();
        assert_eq!(back.extra.get("legacy").map(String::as_str), Some("kept"));

        let again = mapper.to_fields(&back).unwrap();
        assert_eq!(again["legacy"], "kept");
    }

    #[test]
    fn nested_fields_are_rejected() {
        let record = Tagged {
            id: None,
            tags: vec!["a".to_string()],
        };
        let err = RecordMapper::default().to_fields(&record).unwrap_err();
        match err {
            MapError::Nested { model, field } => {
                assert_eq!(model, "tagged");
                assert_eq!(field, "tags");
            }
            other => panic!("expected Nested, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn arbitrary_strings_round_trip(
            title in ".*",
            email in ".*",
            password in ".*",
            raw_id in "[0-9a-f-]{1,36}",
        ) {
            let mapper = RecordMapper::default();
            let record = Profile {
                id: Some(RecordId::parse(raw_id).unwrap()),
                title,
                email,
                password,
            };
            let back: Profile = mapper.from_fields(mapper.to_fields(&record).unwrap()).unwrap();
            prop_assert_eq!(back, record);
        }
    }
}
