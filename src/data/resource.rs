//! Resource - the accumulator threaded through a segment walk.

use super::datum::Datum;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

type Loader = Arc<dyn Fn() -> Result<Vec<Datum>> + Send + Sync>;

/// A lazily evaluated collection, forced with [`Relation::all`].
#[derive(Clone)]
pub struct Relation {
    name: String,
    loader: Loader,
}

impl Relation {
    pub fn new<S, F>(name: S, loader: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> Result<Vec<Datum>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Arc::new(loader),
        }
    }

    /// Name of the entity set or navigation this relation reads from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materialize every row
    pub fn all(&self) -> Result<Vec<Datum>> {
        (self.loader)()
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation").field("name", &self.name).finish()
    }
}

/// Result of executing one or more segments
#[derive(Debug, Clone)]
pub enum Resource {
    /// Concrete, ordered rows
    Collection(Vec<Datum>),
    /// Rows not yet loaded
    Relation(Relation),
    /// A single entity, property value or count
    Value(Datum),
}

impl Resource {
    pub fn is_collection(&self) -> bool {
        matches!(self, Resource::Collection(_) | Resource::Relation(_))
    }

    pub fn as_value(&self) -> Option<&Datum> {
        match self {
            Resource::Value(d) => Some(d),
            _ => None,
        }
    }

    /// Load rows from either collection shape
    pub fn rows(self) -> Result<Option<Vec<Datum>>> {
        match self {
            Resource::Collection(rows) => Ok(Some(rows)),
            Resource::Relation(rel) => rel.all().map(Some),
            Resource::Value(_) => Ok(None),
        }
    }

    /// Force a relation into a concrete collection; other shapes pass through.
    pub fn materialize(self) -> Result<Self> {
        match self {
            Resource::Relation(rel) => Ok(Resource::Collection(rel.all()?)),
            other => Ok(other),
        }
    }

    /// Convert into a plain datum (collections become arrays)
    pub fn into_datum(self) -> Result<Datum> {
        match self {
            Resource::Collection(rows) => Ok(Datum::Array(rows)),
            Resource::Relation(rel) => Ok(Datum::Array(rel.all()?)),
            Resource::Value(d) => Ok(d),
        }
    }
}
