//! Key segment, e.g. `7` in `Products/7`

use super::{single_arg, Segment, SegmentContext, SegmentKind};
use crate::data::{Datum, Resource};
use crate::error::{Error, Result};
use crate::options::OptionMap;
use crate::services::EntityType;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KeySegment {
    key: Datum,
    entity_type: Option<Arc<dyn EntityType>>,
}

impl KeySegment {
    pub fn new(key: Datum, entity_type: Option<Arc<dyn EntityType>>) -> Self {
        Self { key, entity_type }
    }

    /// One primitive argument: the key value. The entity type comes from the
    /// collection segment before it.
    pub fn from_args(ctx: SegmentContext<'_>, args: &[Datum]) -> Result<Self> {
        let key = single_arg(SegmentKind::Key, args)?;
        if matches!(key, Datum::Null | Datum::Array(_) | Datum::Object(_)) {
            return Err(Error::InvalidArgument(format!(
                "Key expects a primitive value, got {}",
                key
            )));
        }
        let entity_type = ctx
            .previous
            .filter(|previous| previous.yields_collection())
            .and_then(|previous| previous.entity_type());
        Ok(Self::new(key.clone(), entity_type))
    }

    pub fn key(&self) -> &Datum {
        &self.key
    }
}

impl Segment for KeySegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Key
    }

    fn value(&self) -> String {
        self.key.to_literal()
    }

    fn can_follow(&self, previous: &dyn Segment) -> bool {
        previous.yields_collection()
    }

    /// Picks the entity with this key out of the incoming collection.
    fn execute(&self, acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        let (Some(entity_type), Some(acc)) = (&self.entity_type, acc) else {
            return Ok(None);
        };
        let key_property = entity_type.key_property();
        let found = acc
            .rows()?
            .and_then(|rows| {
                rows.into_iter()
                    .find(|row| row.get(key_property) == Some(&self.key))
            });

        debug!(
            entity_set = %entity_type.name(),
            key = %self.key.to_literal(),
            found = found.is_some(),
            "Key lookup"
        );
        Ok(found.map(Resource::Value))
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        matches!(result, Some(Resource::Value(Datum::Object(_))))
    }

    fn entity_type(&self) -> Option<Arc<dyn EntityType>> {
        self.entity_type.clone()
    }
}
