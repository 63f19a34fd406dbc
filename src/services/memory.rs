//! In-memory data services
//!
//! Schema and rows live behind a single lock shared by every entity type
//! handle, so rows inserted after a query was built are visible when its
//! relations are materialized.

use super::schema::{Dataset, EntitySetData, EntitySetSchema, Multiplicity};
use super::{DataServices, EntityType, Limits, NavigationTarget};
use crate::data::{Datum, Relation, Resource};
use crate::error::{Error, Result};
use crate::options::{Direction, OrderPair, QueryOption};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type Store = Arc<RwLock<IndexMap<String, EntitySetData>>>;

/// In-memory data service for tests, demos and the CLI
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataServices {
    store: Store,
}

impl InMemoryDataServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a dataset, validating keys and navigation targets
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let services = Self::new();
        for set in &dataset.entity_sets {
            services.define_entity_set(set.schema.clone())?;
        }
        for set in dataset.entity_sets {
            for row in set.rows {
                services.insert(&set.schema.name, row)?;
            }
        }
        services.validate_navigations()?;
        Ok(services)
    }

    /// Load a JSON dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let services = Self::from_dataset(Dataset::load(path)?)?;
        info!(path = %path.display(), sets = services.entity_sets().len(), "Loaded dataset");
        Ok(services)
    }

    pub fn define_entity_set(&self, schema: EntitySetSchema) -> Result<()> {
        let mut store = self.store.write();
        if store.contains_key(&schema.name) {
            return Err(Error::InvalidArgument(format!(
                "entity set '{}' already defined",
                schema.name
            )));
        }
        debug!(entity_set = %schema.name, key = %schema.key, "Defining entity set");
        store.insert(
            schema.name.clone(),
            EntitySetData {
                schema,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Insert one entity; it must be an object carrying a unique key
    pub fn insert(&self, entity_set: &str, row: Datum) -> Result<()> {
        let mut store = self.store.write();
        let set = store
            .get_mut(entity_set)
            .ok_or_else(|| Error::NotFound(format!("entity set '{}'", entity_set)))?;

        let key = row.get(&set.schema.key).cloned().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "{} row is missing key property '{}'",
                entity_set, set.schema.key
            ))
        })?;
        if set.rows.iter().any(|r| r.get(&set.schema.key) == Some(&key)) {
            return Err(Error::InvalidArgument(format!(
                "duplicate key {} in {}",
                key.to_literal(),
                entity_set
            )));
        }

        set.rows.push(row);
        Ok(())
    }

    /// Number of rows in an entity set
    pub fn len(&self, entity_set: &str) -> usize {
        self.store
            .read()
            .get(entity_set)
            .map(|set| set.rows.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().values().all(|set| set.rows.is_empty())
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Dataset {
        Dataset {
            entity_sets: self.store.read().values().cloned().collect(),
        }
    }

    fn validate_navigations(&self) -> Result<()> {
        let store = self.store.read();
        for set in store.values() {
            for nav in &set.schema.navigations {
                if !store.contains_key(&nav.target) {
                    return Err(Error::InvalidArgument(format!(
                        "navigation {}.{} targets unknown entity set '{}'",
                        set.schema.name, nav.name, nav.target
                    )));
                }
            }
        }
        Ok(())
    }
}

impl DataServices for InMemoryDataServices {
    fn entity_type(&self, entity_set: &str) -> Option<Arc<dyn EntityType>> {
        let schema = self.store.read().get(entity_set)?.schema.clone();
        Some(Arc::new(MemoryEntityType {
            schema,
            store: Arc::clone(&self.store),
        }))
    }

    fn entity_sets(&self) -> Vec<String> {
        self.store.read().keys().cloned().collect()
    }
}

#[derive(Debug)]
struct MemoryEntityType {
    schema: EntitySetSchema,
    store: Store,
}

impl MemoryEntityType {
    fn rows_of(store: &Store, entity_set: &str) -> Result<Vec<Datum>> {
        store
            .read()
            .get(entity_set)
            .map(|set| set.rows.clone())
            .ok_or_else(|| Error::NotFound(format!("entity set '{}'", entity_set)))
    }
}

/// Apply `shape` to the rows of a collection; single values pass through.
fn with_rows<F>(results: Resource, shape: F) -> Result<Resource>
where
    F: FnOnce(Vec<Datum>) -> Vec<Datum>,
{
    match results {
        Resource::Value(_) => Ok(results),
        collection => {
            let rows = collection.rows()?.unwrap_or_default();
            Ok(Resource::Collection(shape(rows)))
        }
    }
}

fn compare_by(pairs: &[OrderPair], a: &Datum, b: &Datum) -> Ordering {
    pairs.iter().fold(Ordering::Equal, |ordering, pair| {
        ordering.then_with(|| {
            let left = a.get(&pair.field).unwrap_or(&Datum::Null);
            let right = b.get(&pair.field).unwrap_or(&Datum::Null);
            match pair.direction {
                Direction::Asc => left.compare(right),
                Direction::Desc => right.compare(left),
            }
        })
    })
}

impl EntityType for MemoryEntityType {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn key_property(&self) -> &str {
        &self.schema.key
    }

    fn all(&self) -> Result<Resource> {
        let store = Arc::clone(&self.store);
        let name = self.schema.name.clone();
        Ok(Resource::Relation(Relation::new(
            self.schema.name.clone(),
            move || Self::rows_of(&store, &name),
        )))
    }

    fn navigation(&self, property: &str) -> Option<NavigationTarget> {
        let nav = self.schema.navigation(property)?;
        let schema = self.store.read().get(&nav.target)?.schema.clone();
        Some(NavigationTarget {
            entity_type: Arc::new(MemoryEntityType {
                schema,
                store: Arc::clone(&self.store),
            }),
            multiplicity: nav.multiplicity,
        })
    }

    fn related(&self, entity: &Datum, property: &str) -> Result<Resource> {
        let nav = self.schema.navigation(property).ok_or_else(|| {
            Error::NotFound(format!(
                "navigation property '{}' on {}",
                property, self.schema.name
            ))
        })?;

        let source = entity.get(&nav.source_property).unwrap_or(&Datum::Null);
        let related: Vec<Datum> = Self::rows_of(&self.store, &nav.target)?
            .into_iter()
            .filter(|row| row.get(&nav.target_property) == Some(source))
            .collect();

        debug!(
            entity_set = %self.schema.name,
            navigation = %property,
            related = related.len(),
            "Followed navigation"
        );

        Ok(match nav.multiplicity {
            Multiplicity::Many => Resource::Collection(related),
            Multiplicity::One => {
                Resource::Value(related.into_iter().next().unwrap_or(Datum::Null))
            }
        })
    }

    fn filter(&self, results: Resource, filter: &dyn QueryOption) -> Result<Resource> {
        let expr = filter.filter_expr().ok_or_else(|| {
            Error::InvalidArgument(format!("{} carries no filter expression", filter.key()))
        })?;
        debug!(entity_set = %self.schema.name, filter = %expr, "Filtering");
        with_rows(results, |rows| {
            rows.into_iter().filter(|row| expr.matches(row)).collect()
        })
    }

    fn sort(&self, results: Resource, pairs: &[OrderPair]) -> Result<Resource> {
        debug!(entity_set = %self.schema.name, keys = pairs.len(), "Sorting");
        with_rows(results, |mut rows| {
            rows.sort_by(|a, b| compare_by(pairs, a, b));
            rows
        })
    }

    fn limit(&self, results: Resource, limits: Limits) -> Result<Resource> {
        debug!(entity_set = %self.schema.name, skip = ?limits.skip, top = ?limits.top, "Limiting");
        with_rows(results, |rows| {
            rows.into_iter()
                .skip(limits.skip.unwrap_or(0))
                .take(limits.top.unwrap_or(usize::MAX))
                .collect()
        })
    }
}
