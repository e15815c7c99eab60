//! Shared test model.

use hashmodel_core::{Model, RecordId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Profile {
    #[serde(skip)]
    pub id: Option<RecordId>,
    pub title: String,
    pub email: String,
    pub password: String,
}

impl Model for Profile {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

/// Unsaved profile with the given title and fixed credentials.
pub(crate) fn profile(title: &str) -> Profile {
    Profile {
        id: None,
        title: title.to_string(),
        email: format!("{title}@example.com"),
        password: "secret".to_string(),
    }
}
