//! `$orderby`

use super::{collection_entity_type, OptionKey, OptionKind, QueryOption};
use crate::data::Datum;
use crate::error::{Error, Result};
use crate::segments::Segment;
use crate::services::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort direction '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

/// One `(field, direction)` sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPair {
    pub field: String,
    pub direction: Direction,
}

impl OrderPair {
    pub fn asc<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// `Name` or `Name desc`
    fn parse(text: &str) -> Result<Self> {
        let mut words = text.split_whitespace();
        let field = words
            .next()
            .ok_or_else(|| Error::InvalidArgument("empty $orderby item".to_string()))?;
        let direction = match words.next() {
            Some(dir) => dir.parse()?,
            None => Direction::Asc,
        };
        if let Some(extra) = words.next() {
            return Err(Error::InvalidArgument(format!(
                "unexpected '{}' in $orderby item '{}'",
                extra, text
            )));
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    fn from_datum(item: &Datum) -> Result<Vec<Self>> {
        match item {
            Datum::String(text) => text
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(Self::parse)
                .collect(),
            Datum::Array(pair) => match pair.as_slice() {
                [Datum::String(field)] => Ok(vec![Self::asc(field.as_str())]),
                [Datum::String(field), Datum::String(dir)] => Ok(vec![Self {
                    field: field.clone(),
                    direction: dir.parse()?,
                }]),
                _ => Err(Error::InvalidArgument(format!(
                    "$orderby pair must be [field, direction], got {}",
                    item
                ))),
            },
            other => Err(Error::InvalidArgument(format!(
                "$orderby expects text or pairs, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => f.write_str(&self.field),
            Direction::Desc => write!(f, "{} desc", self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByOption {
    pairs: Vec<OrderPair>,
}

impl OrderByOption {
    pub fn new(pairs: Vec<OrderPair>) -> Self {
        Self { pairs }
    }

    /// Accepts `"Name desc, Price"`, `[["Name", "desc"], ["Price"]]`, or a
    /// mix of such items spread over several arguments.
    pub fn from_args(args: &[Datum]) -> Result<Self> {
        let items: Vec<&Datum> = match args {
            [Datum::Array(items)] if !is_pair(items) => items.iter().collect(),
            _ => args.iter().collect(),
        };

        let mut pairs = Vec::new();
        for item in items {
            pairs.extend(OrderPair::from_datum(item)?);
        }
        Ok(Self::new(pairs))
    }
}

/// `[field]` or `[field, direction]`, as opposed to a list of items
fn is_pair(items: &[Datum]) -> bool {
    match items {
        [Datum::String(_)] => true,
        [Datum::String(_), Datum::String(dir)] => dir.parse::<Direction>().is_ok(),
        _ => false,
    }
}

impl QueryOption for OrderByOption {
    fn kind(&self) -> OptionKind {
        OptionKind::OrderBy
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::ORDERBY)
    }

    fn value(&self) -> String {
        self.pairs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn entity_type(&self, segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
        collection_entity_type(segments)
    }

    fn pairs(&self) -> Option<&[OrderPair]> {
        Some(&self.pairs)
    }
}
