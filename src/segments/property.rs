//! Property segments: `Name` and the raw `$value` that may follow it

use super::{addresses_entity, name_arg, no_args, Segment, SegmentKind};
use crate::data::{Datum, Resource};
use crate::error::Result;
use crate::options::OptionMap;

/// A named property of the entity addressed so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySegment {
    name: String,
}

impl PropertySegment {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        name_arg(SegmentKind::Property, args).map(Self::new)
    }
}

impl Segment for PropertySegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Property
    }

    fn value(&self) -> String {
        self.name.clone()
    }

    fn can_follow(&self, previous: &dyn Segment) -> bool {
        addresses_entity(previous)
    }

    fn execute(&self, acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        Ok(acc
            .as_ref()
            .and_then(Resource::as_value)
            .and_then(|entity| entity.get(&self.name))
            .cloned()
            .map(Resource::Value))
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        matches!(result, Some(Resource::Value(_)))
    }
}

/// `$value`: the raw, primitive value of the preceding property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueSegment;

impl ValueSegment {
    pub const TOKEN: &'static str = "$value";

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        no_args(SegmentKind::Value, args).map(|_| ValueSegment)
    }
}

impl Segment for ValueSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Value
    }

    fn value(&self) -> String {
        Self::TOKEN.to_string()
    }

    fn can_follow(&self, previous: &dyn Segment) -> bool {
        previous.kind() == SegmentKind::Property
    }

    fn execute(&self, acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        Ok(acc)
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        matches!(
            result,
            Some(Resource::Value(
                Datum::Boolean(_) | Datum::Number(_) | Datum::String(_)
            ))
        )
    }
}
