//! Entity set schema and the JSON dataset format.
//!
//! ```json
//! {
//!   "entity_sets": [
//!     {
//!       "name": "Products",
//!       "key": "ID",
//!       "navigations": [
//!         {"name": "Category", "target": "Categories",
//!          "source_property": "CategoryID", "target_property": "ID",
//!          "multiplicity": "one"}
//!       ],
//!       "rows": [{"ID": 1, "Name": "Bread", "CategoryID": 1}]
//!     }
//!   ]
//! }
//! ```

use crate::data::Datum;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    One,
    Many,
}

/// Navigation from one entity set to another.
///
/// Related rows are the target rows whose `target_property` equals the
/// source entity's `source_property`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSchema {
    pub name: String,
    pub target: String,
    pub source_property: String,
    pub target_property: String,
    pub multiplicity: Multiplicity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySetSchema {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub navigations: Vec<NavigationSchema>,
}

impl EntitySetSchema {
    pub fn new<N: Into<String>, K: Into<String>>(name: N, key: K) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            navigations: Vec::new(),
        }
    }

    pub fn with_navigation(
        mut self,
        name: &str,
        target: &str,
        source_property: &str,
        target_property: &str,
        multiplicity: Multiplicity,
    ) -> Self {
        self.navigations.push(NavigationSchema {
            name: name.to_string(),
            target: target.to_string(),
            source_property: source_property.to_string(),
            target_property: target_property.to_string(),
            multiplicity,
        });
        self
    }

    pub fn navigation(&self, name: &str) -> Option<&NavigationSchema> {
        self.navigations.iter().find(|nav| nav.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySetData {
    #[serde(flatten)]
    pub schema: EntitySetSchema,
    #[serde(default)]
    pub rows: Vec<Datum>,
}

/// Serialized contents of an in-memory data service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub entity_sets: Vec<EntitySetData>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::SerializationError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::NotFound(format!("dataset {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}
