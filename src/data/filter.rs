//! Structured `$filter` expressions.
//!
//! Expressions are built programmatically or decoded from a prefix-array
//! datum, mirroring how terms travel on the wire:
//!
//! ```json
//! ["and", ["gt", "Price", 5], ["not", ["eq", "Name", "Bread"]]]
//! ```
//!
//! which renders as `(Price gt 5) and (not (Name eq 'Bread'))`.

use super::datum::Datum;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn name(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Gt => "gt",
            Comparison::Ge => "ge",
            Comparison::Lt => "lt",
            Comparison::Le => "le",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "eq" => Some(Comparison::Eq),
            "ne" => Some(Comparison::Ne),
            "gt" => Some(Comparison::Gt),
            "ge" => Some(Comparison::Ge),
            "lt" => Some(Comparison::Lt),
            "le" => Some(Comparison::Le),
            _ => None,
        }
    }

    fn holds(&self, left: &Datum, right: &Datum) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            // Ordering comparisons only hold between values of the same type.
            _ if std::mem::discriminant(left) != std::mem::discriminant(right) => false,
            Comparison::Gt => left.compare(right) == Ordering::Greater,
            Comparison::Ge => left.compare(right) != Ordering::Less,
            Comparison::Lt => left.compare(right) == Ordering::Less,
            Comparison::Le => left.compare(right) != Ordering::Greater,
        }
    }
}

/// A boolean predicate over a single entity
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Compare {
        op: Comparison,
        property: String,
        value: Datum,
    },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    pub fn compare<S: Into<String>, V: Into<Datum>>(op: Comparison, property: S, value: V) -> Self {
        FilterExpr::Compare {
            op,
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn eq<S: Into<String>, V: Into<Datum>>(property: S, value: V) -> Self {
        Self::compare(Comparison::Eq, property, value)
    }

    pub fn ne<S: Into<String>, V: Into<Datum>>(property: S, value: V) -> Self {
        Self::compare(Comparison::Ne, property, value)
    }

    pub fn gt<S: Into<String>, V: Into<Datum>>(property: S, value: V) -> Self {
        Self::compare(Comparison::Gt, property, value)
    }

    pub fn lt<S: Into<String>, V: Into<Datum>>(property: S, value: V) -> Self {
        Self::compare(Comparison::Lt, property, value)
    }

    pub fn and(self, other: FilterExpr) -> Self {
        FilterExpr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FilterExpr) -> Self {
        FilterExpr::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        FilterExpr::Not(Box::new(self))
    }

    /// Evaluate against an entity. Missing properties compare as null.
    pub fn matches(&self, entity: &Datum) -> bool {
        match self {
            FilterExpr::Compare { op, property, value } => {
                let actual = entity.get(property).unwrap_or(&Datum::Null);
                op.holds(actual, value)
            }
            FilterExpr::And(left, right) => left.matches(entity) && right.matches(entity),
            FilterExpr::Or(left, right) => left.matches(entity) || right.matches(entity),
            FilterExpr::Not(inner) => !inner.matches(entity),
        }
    }

    /// Decode from the prefix-array form `[op, args...]`
    pub fn from_datum(datum: &Datum) -> Result<Self> {
        let parts = datum
            .as_array()
            .ok_or_else(|| Error::InvalidArgument(format!("filter must be an array, got {}", datum)))?;

        let op = parts
            .first()
            .and_then(|d| d.as_string())
            .ok_or_else(|| Error::InvalidArgument("filter operator must be a string".to_string()))?;

        let arity = |n: usize| -> Result<()> {
            if parts.len() != n + 1 {
                return Err(Error::InvalidArgument(format!(
                    "filter operator '{}' takes {} arguments, got {}",
                    op,
                    n,
                    parts.len() - 1
                )));
            }
            Ok(())
        };

        match op.to_ascii_lowercase().as_str() {
            "and" => {
                arity(2)?;
                Ok(Self::from_datum(&parts[1])?.and(Self::from_datum(&parts[2])?))
            }
            "or" => {
                arity(2)?;
                Ok(Self::from_datum(&parts[1])?.or(Self::from_datum(&parts[2])?))
            }
            "not" => {
                arity(1)?;
                Ok(Self::from_datum(&parts[1])?.negate())
            }
            other => {
                let comparison = Comparison::from_name(other)
                    .ok_or_else(|| Error::InvalidArgument(format!("unknown filter operator '{}'", other)))?;
                arity(2)?;
                let property = parts[1].as_string().ok_or_else(|| {
                    Error::InvalidArgument(format!("'{}' expects a property name", other))
                })?;
                Ok(Self::compare(comparison, property, parts[2].clone()))
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Compare { op, property, value } => {
                write!(f, "{} {} {}", property, op.name(), value.to_literal())
            }
            FilterExpr::And(left, right) => write!(f, "({}) and ({})", left, right),
            FilterExpr::Or(left, right) => write!(f, "({}) or ({})", left, right),
            FilterExpr::Not(inner) => write!(f, "not ({})", inner),
        }
    }
}
