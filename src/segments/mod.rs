//! Resource path segments.
//!
//! A segment is one step of a resource path: it renders a path token,
//! declares which segment it may follow, transforms the accumulator handed
//! to it by the previous step, and checks its own result.
//!
//! | Tag          | Token        | Follows                         | Yields          |
//! |--------------|--------------|---------------------------------|-----------------|
//! | `EntitySet`  | `Products`   | nothing (first only)            | lazy collection |
//! | `Key`        | `7`, `'abc'` | a collection                    | one entity      |
//! | `Navigation` | `Category`   | one entity                      | entity or rows  |
//! | `Property`   | `Name`       | one entity                      | property value  |
//! | `Value`      | `$value`     | `Property`                      | raw value       |
//! | `Count`      | `$count`     | a collection                    | row count       |
//!
//! Built-in variants are constructed through [`SegmentKind::build`]; any other
//! [`Segment`] implementation can be appended with
//! [`Query::push_segment`](crate::Query::push_segment).

pub mod count;
pub mod entity_set;
pub mod key;
pub mod navigation;
pub mod property;

pub use count::CountSegment;
pub use entity_set::EntitySetSegment;
pub use key::KeySegment;
pub use navigation::NavigationSegment;
pub use property::{PropertySegment, ValueSegment};

use crate::data::{Datum, Resource};
use crate::error::{Error, Result};
use crate::options::OptionMap;
use crate::services::{DataServices, EntityType};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Context handed to a segment at construction.
///
/// `previous` is the segment registered just before this one, so variants
/// can resolve what they address from what precedes them.
#[derive(Clone, Copy)]
pub struct SegmentContext<'a> {
    pub services: &'a Arc<dyn DataServices>,
    pub previous: Option<&'a dyn Segment>,
}

/// Segment variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    EntitySet,
    Key,
    Navigation,
    Property,
    Value,
    Count,
    /// Implemented outside this crate; not constructible from a tag
    Custom,
}

impl SegmentKind {
    /// Variants resolvable from a tag
    pub const BUILTIN: [SegmentKind; 6] = [
        SegmentKind::EntitySet,
        SegmentKind::Key,
        SegmentKind::Navigation,
        SegmentKind::Property,
        SegmentKind::Value,
        SegmentKind::Count,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::EntitySet => "EntitySet",
            SegmentKind::Key => "Key",
            SegmentKind::Navigation => "Navigation",
            SegmentKind::Property => "Property",
            SegmentKind::Value => "Value",
            SegmentKind::Count => "Count",
            SegmentKind::Custom => "Custom",
        }
    }

    /// Resolve a tag case-insensitively. `Entity` and `Collection` are
    /// accepted for `EntitySet`.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("Entity") || tag.eq_ignore_ascii_case("Collection") {
            return Ok(SegmentKind::EntitySet);
        }
        Self::BUILTIN
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(tag))
            .ok_or_else(|| Error::UnknownVariant {
                family: "segment",
                tag: tag.to_string(),
            })
    }

    /// Construct the variant from its arguments
    pub fn build(&self, ctx: SegmentContext<'_>, args: &[Datum]) -> Result<Box<dyn Segment>> {
        Ok(match self {
            SegmentKind::EntitySet => Box::new(EntitySetSegment::from_args(ctx, args)?),
            SegmentKind::Key => Box::new(KeySegment::from_args(ctx, args)?),
            SegmentKind::Navigation => Box::new(NavigationSegment::from_args(ctx, args)?),
            SegmentKind::Property => Box::new(PropertySegment::from_args(args)?),
            SegmentKind::Value => Box::new(ValueSegment::from_args(args)?),
            SegmentKind::Count => Box::new(CountSegment::from_args(args)?),
            SegmentKind::Custom => {
                return Err(Error::UnknownVariant {
                    family: "segment",
                    tag: self.name().to_string(),
                })
            }
        })
    }
}

impl FromStr for SegmentKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        SegmentKind::from_tag(tag)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of a resource path
pub trait Segment: fmt::Debug {
    fn kind(&self) -> SegmentKind;

    /// Path token; a blank token ends the walk at this segment
    fn value(&self) -> String;

    /// Whether this segment may directly follow `previous`
    fn can_follow(&self, previous: &dyn Segment) -> bool;

    /// Transform the accumulator
    fn execute(&self, acc: Option<Resource>, options: &OptionMap) -> Result<Option<Resource>>;

    /// Postcondition on this segment's own result
    fn is_valid(&self, result: &Option<Resource>) -> bool;

    /// Entity type addressed by this segment
    fn entity_type(&self) -> Option<Arc<dyn EntityType>> {
        None
    }

    /// Whether this segment addresses a collection rather than a single value
    fn yields_collection(&self) -> bool {
        false
    }

    /// `Kind(token)`, used in error reports and logs
    fn describe(&self) -> String {
        format!("{}({})", self.kind(), self.value())
    }
}

/// Exactly one argument
pub(crate) fn single_arg<'a>(kind: SegmentKind, args: &'a [Datum]) -> Result<&'a Datum> {
    match args {
        [arg] => Ok(arg),
        _ => Err(Error::InvalidArgument(format!(
            "{} takes exactly one argument, got {}",
            kind,
            args.len()
        ))),
    }
}

/// Exactly one non-empty string argument
pub(crate) fn name_arg(kind: SegmentKind, args: &[Datum]) -> Result<String> {
    match single_arg(kind, args)? {
        Datum::String(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        other => Err(Error::InvalidArgument(format!(
            "{} expects a name, got {}",
            kind, other
        ))),
    }
}

pub(crate) fn no_args(kind: SegmentKind, args: &[Datum]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{} takes no arguments, got {}",
            kind,
            args.len()
        )))
    }
}

/// A single entity: a `Key` segment or a single-valued `Navigation`
pub(crate) fn addresses_entity(segment: &dyn Segment) -> bool {
    matches!(segment.kind(), SegmentKind::Key | SegmentKind::Navigation)
        && !segment.yields_collection()
}
