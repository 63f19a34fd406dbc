//! `$skip` and `$top`

use super::{collection_entity_type, single_arg, OptionKey, OptionKind, QueryOption};
use crate::data::Datum;
use crate::error::{Error, Result};
use crate::segments::Segment;
use crate::services::EntityType;
use std::sync::Arc;

fn count_arg(kind: OptionKind, args: &[Datum]) -> Result<usize> {
    let arg = single_arg(kind, args)?;
    let count = match arg {
        Datum::String(text) => text.trim().parse::<usize>().ok(),
        other => other.as_count(),
    };
    count.ok_or_else(|| {
        Error::InvalidArgument(format!("{} expects a non-negative integer, got {}", kind, arg))
    })
}

/// Rows to skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOption {
    count: usize,
}

impl SkipOption {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        count_arg(OptionKind::Skip, args).map(Self::new)
    }
}

impl QueryOption for SkipOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Skip
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::SKIP)
    }

    fn value(&self) -> String {
        self.count.to_string()
    }

    fn entity_type(&self, segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
        collection_entity_type(segments)
    }

    fn count(&self) -> Option<usize> {
        Some(self.count)
    }
}

/// Maximum rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOption {
    count: usize,
}

impl TopOption {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        count_arg(OptionKind::Top, args).map(Self::new)
    }
}

impl QueryOption for TopOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Top
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::TOP)
    }

    fn value(&self) -> String {
        self.count.to_string()
    }

    fn entity_type(&self, segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
        collection_entity_type(segments)
    }

    fn count(&self) -> Option<usize> {
        Some(self.count)
    }
}
