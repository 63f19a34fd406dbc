//! Entity set segment, e.g. `Products`

use super::{name_arg, Segment, SegmentContext, SegmentKind};
use crate::data::{Datum, Resource};
use crate::error::{Error, Result};
use crate::options::OptionMap;
use crate::services::EntityType;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EntitySetSegment {
    entity_type: Arc<dyn EntityType>,
}

impl EntitySetSegment {
    pub fn new(entity_type: Arc<dyn EntityType>) -> Self {
        Self { entity_type }
    }

    /// One argument: the entity set name, resolved against the data services
    pub fn from_args(ctx: SegmentContext<'_>, args: &[Datum]) -> Result<Self> {
        let name = name_arg(SegmentKind::EntitySet, args)?;
        let entity_type = ctx
            .services
            .entity_type(&name)
            .ok_or_else(|| Error::NotFound(format!("entity set '{}'", name)))?;
        Ok(Self::new(entity_type))
    }
}

impl Segment for EntitySetSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::EntitySet
    }

    fn value(&self) -> String {
        self.entity_type.name().to_string()
    }

    /// Entity sets only start a path.
    fn can_follow(&self, _previous: &dyn Segment) -> bool {
        false
    }

    fn execute(&self, _acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        self.entity_type.all().map(Some)
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        result.as_ref().is_some_and(Resource::is_collection)
    }

    fn entity_type(&self) -> Option<Arc<dyn EntityType>> {
        Some(Arc::clone(&self.entity_type))
    }

    fn yields_collection(&self) -> bool {
        true
    }
}
