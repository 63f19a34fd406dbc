//! Data services layer
//!
//! # Architecture
//!
//! A query is built against a [`DataServices`] root, which resolves entity
//! set names to [`EntityType`] handles:
//!
//! ```text
//! DataServices (entity set name → EntityType)
//!   └─→ EntityType (rows, key lookup, navigation)
//!        └─→ shaping: filter / sort / limit over a Resource
//! ```
//!
//! Segments use the row-level operations while walking the resource path;
//! the query executor uses the shaping trio after the walk.
//!
//! ## Implementation
//!
//! [`InMemoryDataServices`] keeps schema and rows behind a lock and can be
//! loaded from a JSON dataset file.

pub mod memory;
pub mod schema;

pub use memory::InMemoryDataServices;
pub use schema::{Dataset, EntitySetSchema, Multiplicity, NavigationSchema};

use crate::data::{Datum, Resource};
use crate::error::{Error, Result};
use crate::options::{OrderPair, QueryOption};
use crate::query::Query;
use std::fmt;
use std::sync::Arc;

/// Bounds for the `$skip`/`$top` stage; `None` means unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub skip: Option<usize>,
    pub top: Option<usize>,
}

/// Target of a navigation property
#[derive(Clone)]
pub struct NavigationTarget {
    pub entity_type: Arc<dyn EntityType>,
    pub multiplicity: Multiplicity,
}

impl fmt::Debug for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationTarget")
            .field("entity_type", &self.entity_type.name())
            .field("multiplicity", &self.multiplicity)
            .finish()
    }
}

/// Operations keyed to one entity type
pub trait EntityType: Send + Sync + fmt::Debug {
    /// Entity set name
    fn name(&self) -> &str;

    /// Property holding each entity's key
    fn key_property(&self) -> &str;

    /// Every entity of this type, usually as a lazy relation
    fn all(&self) -> Result<Resource>;

    /// Navigation property declared on this type
    fn navigation(&self, _property: &str) -> Option<NavigationTarget> {
        None
    }

    /// Follow a navigation property from one entity
    fn related(&self, _entity: &Datum, property: &str) -> Result<Resource> {
        Err(Error::NotFound(format!(
            "navigation property '{}' on {}",
            property,
            self.name()
        )))
    }

    /// Keep rows matching the option's filter expression
    fn filter(&self, results: Resource, filter: &dyn QueryOption) -> Result<Resource>;

    /// Order rows by the given keys
    fn sort(&self, results: Resource, pairs: &[OrderPair]) -> Result<Resource>;

    /// Apply skip, then top
    fn limit(&self, results: Resource, limits: Limits) -> Result<Resource>;
}

/// Root context a query is built against
pub trait DataServices: Send + Sync + fmt::Debug {
    /// Resolve an entity set name
    fn entity_type(&self, entity_set: &str) -> Option<Arc<dyn EntityType>>;

    /// Names of every entity set
    fn entity_sets(&self) -> Vec<String>;

    /// Start an empty query rooted at these services
    fn query(self: Arc<Self>) -> Query
    where
        Self: Sized + 'static,
    {
        Query::new(self)
    }
}
