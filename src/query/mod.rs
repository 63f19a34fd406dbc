//! Query construction and execution engine

pub mod compiler;
pub mod executor;

pub use compiler::QueryCompiler;
pub use executor::QueryExecutor;

use crate::data::{Datum, Resource};
use crate::error::Result;
use crate::options::{OptionKey, OptionKind, OptionMap, QueryOption};
use crate::segments::{Segment, SegmentContext, SegmentKind};
use crate::services::DataServices;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A resource path plus query options, built against a data services root.
///
/// Segments render and execute in registration order. Options are keyed by
/// canonical key; registering a second option under the same key replaces
/// the first.
///
/// # Example
///
/// ```rust,ignore
/// let mut query = Query::new(services);
/// query.segment(SegmentKind::EntitySet, &["Products".into()])?;
/// query.segment(SegmentKind::Key, &[7.into()])?;
/// query.option(OptionKind::Select, &["Name".into()])?;
///
/// assert_eq!(query.to_uri(), "Products/7?$select=Name");
/// let product = query.execute()?;
/// ```
pub struct Query {
    services: Arc<dyn DataServices>,
    segments: Vec<Box<dyn Segment>>,
    options: OptionMap,
}

impl Query {
    pub fn new(services: Arc<dyn DataServices>) -> Self {
        Self {
            services,
            segments: Vec::new(),
            options: OptionMap::new(),
        }
    }

    /// Start from already constructed segments and options.
    ///
    /// Options go through [`Query::push_option`], so a later option replaces
    /// an earlier one under the same key.
    pub fn with_parts<S, O>(services: Arc<dyn DataServices>, segments: S, options: O) -> Self
    where
        S: IntoIterator<Item = Box<dyn Segment>>,
        O: IntoIterator<Item = Box<dyn QueryOption>>,
    {
        let mut query = Self::new(services);
        query.segments.extend(segments);
        for option in options {
            query.push_option(option);
        }
        query
    }

    pub fn services(&self) -> &Arc<dyn DataServices> {
        &self.services
    }

    pub fn segments(&self) -> &[Box<dyn Segment>] {
        &self.segments
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    /// Look up an option by key, e.g. `"$top"`
    pub fn get_option(&self, key: &str) -> Option<&dyn QueryOption> {
        self.options
            .get(OptionKey::new(key).as_str())
            .map(|option| option.as_ref())
    }

    /// Construct a built-in segment variant and append it.
    ///
    /// Nothing is appended if construction fails.
    pub fn segment(&mut self, kind: SegmentKind, args: &[Datum]) -> Result<&dyn Segment> {
        let ctx = SegmentContext {
            services: &self.services,
            previous: self.segments.last().map(|segment| segment.as_ref()),
        };
        let segment = kind.build(ctx, args)?;
        Ok(self.push_segment(segment))
    }

    /// Like [`Query::segment`], resolving the variant from a tag first
    pub fn segment_tag(&mut self, tag: &str, args: &[Datum]) -> Result<&dyn Segment> {
        let kind: SegmentKind = tag.parse()?;
        self.segment(kind, args)
    }

    /// Append an already constructed segment
    pub fn push_segment(&mut self, segment: Box<dyn Segment>) -> &dyn Segment {
        debug!(segment = %segment.describe(), position = self.segments.len(), "Appending segment");
        self.segments.push(segment);
        let last = self.segments.len() - 1;
        self.segments[last].as_ref()
    }

    /// Construct a built-in option variant and store it under its key.
    ///
    /// Nothing is stored if construction fails.
    pub fn option(&mut self, kind: OptionKind, args: &[Datum]) -> Result<&dyn QueryOption> {
        let option = kind.build(args)?;
        Ok(self.push_option(option))
    }

    /// Like [`Query::option`], resolving the variant from a tag (`Top` or
    /// `$top`) first
    pub fn option_tag(&mut self, tag: &str, args: &[Datum]) -> Result<&dyn QueryOption> {
        let kind: OptionKind = tag.parse()?;
        self.option(kind, args)
    }

    /// Store an already constructed option, replacing any under the same key
    pub fn push_option(&mut self, option: Box<dyn QueryOption>) -> &dyn QueryOption {
        let key = option.key();
        debug!(key = %key, value = %option.value(), "Setting option");
        let (index, _replaced) = self.options.insert_full(key, option);
        self.options[index].as_ref()
    }

    /// Segment tokens joined with `/`
    pub fn resource_path(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.value())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Options rendered as `key=value`, joined with `&`
    pub fn query_string(&self) -> String {
        self.options
            .iter()
            .map(|(key, option)| format!("{}={}", key, option.value()))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `path`, or `path?query` when there are options
    pub fn to_uri(&self) -> String {
        let path = self.resource_path();
        let query = self.query_string();
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }

    /// Walk the segments, then shape the result with the query's options
    pub fn execute(&self) -> Result<Option<Resource>> {
        QueryExecutor::new(self).execute()
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("uri", &self.to_uri())
            .field("segments", &self.segments)
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}
