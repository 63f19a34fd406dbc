//! `$select` and `$expand`
//!
//! These contribute to the query string only; projection and expansion are
//! left to whatever consumes the rendered URI.

use super::{name_list, OptionKey, OptionKind, QueryOption};
use crate::data::Datum;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    fields: Vec<String>,
}

impl SelectOption {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        name_list(OptionKind::Select, args).map(Self::new)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl QueryOption for SelectOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Select
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::SELECT)
    }

    fn value(&self) -> String {
        self.fields.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOption {
    paths: Vec<String>,
}

impl ExpandOption {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn from_args(args: &[Datum]) -> Result<Self> {
        name_list(OptionKind::Expand, args).map(Self::new)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl QueryOption for ExpandOption {
    fn kind(&self) -> OptionKind {
        OptionKind::Expand
    }

    fn key(&self) -> OptionKey {
        OptionKey::new(OptionKey::EXPAND)
    }

    fn value(&self) -> String {
        self.paths.join(",")
    }
}
