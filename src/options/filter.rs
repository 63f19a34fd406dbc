//! `$filter`

use super::{collection_entity_type, single_arg, OptionKey, OptionKind, QueryOption};
use crate::data::{Datum, FilterExpr};
use crate::error::Result;
use crate::segments::Segment;
use crate::services::EntityType;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    expr: FilterExpr,
}

impl FilterOption {
    pub fn new(expr: FilterExpr) -> Self {
        Self { expr }
    }

    /// One argument in prefix-array form, e.g. `["gt", "Price", 5]`
    pub fn from_args(args: &[Datum]) -> Result<Self> {
        let arg = single_arg(OptionKind::Filter, args)?;
        Ok(Self::new(FilterExpr::from_datum(arg)?))
    }

    pub fn expr(&self) -> &FilterExpr {
        &self.expr
    }
}

impl QueryOption for FilterOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Filter
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::FILTER)
    }

    fn value(&self) -> String {
        self.expr.to_string()
    }

    fn entity_type(&self, segments: &[Box<dyn Segment>]) -> Option<Arc<dyn EntityType>> {
        collection_entity_type(segments)
    }

    fn filter_expr(&self) -> Option<&FilterExpr> {
        Some(&self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_renders_expression() {
        let option = FilterOption::new(FilterExpr::gt("Price", 5));
        assert_eq!(option.key().as_str(), "$filter");
        assert_eq!(option.value(), "Price gt 5");
        assert_eq!(option.filter_expr(), Some(&FilterExpr::gt("Price", 5)));
    }

    #[test]
    fn test_filter_needs_collection_path() {
        let option = FilterOption::new(FilterExpr::gt("Price", 5));
        assert!(option.entity_type(&[]).is_none());
    }
}
