//! Query options - the `key=value` modifiers of a query string.
//!
//! Every option exposes a canonical [`OptionKey`] and a rendered value.
//! The result-shaping options (`$filter`, `$orderby`, `$skip`, `$top`)
//! additionally resolve an [`EntityType`] whose `filter`/`sort`/`limit`
//! operations the executor applies after the segment walk.
//!
//! Built-in variants form a closed registry, [`OptionKind`], so tags coming
//! from the outside (`"Top"`, `"$top"`) resolve to a constructor or fail with
//! [`Error::UnknownVariant`]. Anything else implementing [`QueryOption`] can be
//! registered directly with [`Query::push_option`](crate::Query::push_option).

pub mod filter;
pub mod general;
pub mod orderby;
pub mod paging;
pub mod projection;

pub use filter::FilterOption;
pub use general::{CustomOption, FormatOption, InlineCount, InlineCountOption};
pub use orderby::{Direction, OrderByOption, OrderPair};
pub use paging::{SkipOption, TopOption};
pub use projection::{ExpandOption, SelectOption};

use crate::data::{Datum, FilterExpr};
use crate::error::{Error, Result};
use crate::segments::Segment;
use crate::services::EntityType;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Options of a query, keyed by canonical key in registration order
pub type OptionMap = IndexMap<OptionKey, Box<dyn QueryOption>>;

/// Canonical, normalized option key.
///
/// System options (`$`-prefixed) are case-insensitive and stored lowercase;
/// custom option names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey(String);

impl OptionKey {
    pub const FILTER: &'static str = "$filter";
    pub const ORDERBY: &'static str = "$orderby";
    pub const SKIP: &'static str = "$skip";
    pub const TOP: &'static str = "$top";
    pub const SELECT: &'static str = "$select";
    pub const EXPAND: &'static str = "$expand";
    pub const FORMAT: &'static str = "$format";
    pub const INLINECOUNT: &'static str = "$inlinecount";

    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('$') {
            OptionKey(raw.to_ascii_lowercase())
        } else {
            OptionKey(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        self.0.starts_with('$')
    }
}

impl From<&str> for OptionKey {
    fn from(raw: &str) -> Self {
        OptionKey::new(raw)
    }
}

impl Borrow<str> for OptionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in option variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Filter,
    OrderBy,
    Skip,
    Top,
    Select,
    Expand,
    Format,
    InlineCount,
    Custom,
}

impl OptionKind {
    pub const ALL: [OptionKind; 9] = [
        OptionKind::Filter,
        OptionKind::OrderBy,
        OptionKind::Skip,
        OptionKind::Top,
        OptionKind::Select,
        OptionKind::Expand,
        OptionKind::Format,
        OptionKind::InlineCount,
        OptionKind::Custom,
    ];

    /// Variant tag
    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Filter => "Filter",
            OptionKind::OrderBy => "OrderBy",
            OptionKind::Skip => "Skip",
            OptionKind::Top => "Top",
            OptionKind::Select => "Select",
            OptionKind::Expand => "Expand",
            OptionKind::Format => "Format",
            OptionKind::InlineCount => "InlineCount",
            OptionKind::Custom => "Custom",
        }
    }

    /// Canonical key for system options
    pub fn key(&self) -> Option<&'static str> {
        match self {
            OptionKind::Filter => Some(OptionKey::FILTER),
            OptionKind::OrderBy => Some(OptionKey::ORDERBY),
            OptionKind::Skip => Some(OptionKey::SKIP),
            OptionKind::Top => Some(OptionKey::TOP),
            OptionKind::Select => Some(OptionKey::SELECT),
            OptionKind::Expand => Some(OptionKey::EXPAND),
            OptionKind::Format => Some(OptionKey::FORMAT),
            OptionKind::InlineCount => Some(OptionKey::INLINECOUNT),
            OptionKind::Custom => None,
        }
    }

    /// Resolve a tag: either the variant name (`OrderBy`) or its canonical
    /// key (`$orderby`), case-insensitively.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(tag)
                    || kind.key().is_some_and(|key| key.eq_ignore_ascii_case(tag))
            })
            .ok_or_else(|| Error::UnknownVariant {
                family: "option",
                tag: tag.to_string(),
            })
    }

    /// Construct the variant from its arguments
    pub fn build(&self, args: &[Datum]) -> Result<Box<dyn QueryOption>> {
        Ok(match self {
            OptionKind::Filter => Box::new(FilterOption::from_args(args)?),
            OptionKind::OrderBy => Box::new(OrderByOption::from_args(args)?),
            OptionKind::Skip => Box::new(SkipOption::from_args(args)?),
            OptionKind::Top => Box::new(TopOption::from_args(args)?),
            OptionKind::Select => Box::new(SelectOption::from_args(args)?),
            OptionKind::Expand => Box::new(ExpandOption::from_args(args)?),
            OptionKind::Format => Box::new(FormatOption::from_args(args)?),
            OptionKind::InlineCount => Box::new(InlineCountOption::from_args(args)?),
            OptionKind::Custom => Box::new(CustomOption::from_args(args)?),
        })
    }
}

impl FromStr for OptionKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        OptionKind::from_tag(tag)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One query modifier
pub trait QueryOption: fmt::Debug {
    fn kind(&self) -> OptionKind;

    /// Canonical key this option is stored under
    fn key(&self) -> OptionKey;

    /// Rendered value for the query string
    fn value(&self) -> String;

    fn is_blank(&self) -> bool {
        self.value().trim().is_empty()
    }

    /// Entity type used to shape results, if this option shapes them
    fn entity_type(&self, _segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
        None
    }

    /// Ordered `(field, direction)` pairs for `$orderby`
    fn pairs(&self) -> Option<&[OrderPair]> {
        None
    }

    /// Row count for `$skip` and `$top`
    fn count(&self) -> Option<usize> {
        None
    }

    /// Predicate for `$filter`
    fn filter_expr(&self) -> Option<&FilterExpr> {
        None
    }
}

/// Entity type of the collection the path addresses, if it addresses one.
pub fn collection_entity_type(segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
    segments
        .last()
        .filter(|segment| segment.yields_collection())
        .and_then(|segment| segment.entity_type())
}

/// Exactly one argument
pub(crate) fn single_arg<'a>(kind: OptionKind, args: &'a [Datum]) -> Result<&'a Datum> {
    match args {
        [arg] => Ok(arg),
        _ => Err(Error::InvalidArgument(format!(
            "{} takes exactly one argument, got {}",
            kind,
            args.len()
        ))),
    }
}

/// Names given as one comma-separated string, several strings, or one array
pub(crate) fn name_list(kind: OptionKind, args: &[Datum]) -> Result<Vec<String>> {
    let items: Vec<&Datum> = match args {
        [Datum::Array(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    };

    let mut names = Vec::new();
    for item in items {
        let text = item.as_string().ok_or_else(|| {
            Error::InvalidArgument(format!("{} expects names, got {}", kind, item))
        })?;
        names.extend(
            text.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
    }
    Ok(names)
}
