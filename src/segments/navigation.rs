//! Navigation property segment, e.g. `Category` in `Products/7/Category`

use super::{addresses_entity, name_arg, Segment, SegmentContext, SegmentKind};
use crate::data::{Datum, Resource};
use crate::error::Result;
use crate::options::OptionMap;
use crate::services::{EntityType, Multiplicity, NavigationTarget};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NavigationSegment {
    property: String,
    source: Option<Arc<dyn EntityType>>,
    target: Option<NavigationTarget>,
}

impl NavigationSegment {
    /// One argument: the navigation property name, declared on the entity
    /// type of the segment before it.
    pub fn from_args(ctx: SegmentContext<'_>, args: &[Datum]) -> Result<Self> {
        let property = name_arg(SegmentKind::Navigation, args)?;
        let source = ctx.previous.and_then(|previous| previous.entity_type());
        let target = source.as_ref().and_then(|source| source.navigation(&property));
        Ok(Self {
            property,
            source,
            target,
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl Segment for NavigationSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Navigation
    }

    fn value(&self) -> String {
        self.property.clone()
    }

    fn can_follow(&self, previous: &dyn Segment) -> bool {
        addresses_entity(previous)
    }

    fn execute(&self, acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        let (Some(source), Some(Resource::Value(entity))) = (&self.source, acc) else {
            return Ok(None);
        };
        source.related(&entity, &self.property).map(Some)
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        match (&self.target, result) {
            (Some(target), Some(resource)) => match target.multiplicity {
                Multiplicity::Many => resource.is_collection(),
                Multiplicity::One => matches!(resource, Resource::Value(Datum::Object(_))),
            },
            _ => false,
        }
    }

    fn entity_type(&self) -> Option<Arc<dyn EntityType>> {
        self.target.as_ref().map(|target| Arc::clone(&target.entity_type))
    }

    fn yields_collection(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.multiplicity == Multiplicity::Many)
    }
}
