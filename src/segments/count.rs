//! `$count`

use super::{no_args, Segment, SegmentKind};
use crate::data::{Datum, Resource};
use crate::error::Result;
use crate::options::OptionMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountSegment;

impl CountSegment {
    pub const TOKEN: &'static str = "$count";

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        no_args(SegmentKind::Count, args).map(|_| CountSegment)
    }
}

impl Segment for CountSegment {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Count
    }

    fn value(&self) -> String {
        Self::TOKEN.to_string()
    }

    fn can_follow(&self, previous: &dyn Segment) -> bool {
        previous.yields_collection()
    }

    fn execute(&self, acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        let Some(acc) = acc else {
            return Ok(None);
        };
        Ok(acc
            .rows()?
            .map(|rows| Resource::Value(Datum::from(rows.len()))))
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        matches!(result, Some(Resource::Value(Datum::Number(_))))
    }
}
