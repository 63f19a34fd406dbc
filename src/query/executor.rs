//! Query Executor.
//!
//! Runs a [`Query`] in two phases.
//!
//! # Segment walk
//!
//! A linear fold over the segments in registration order, threading an
//! accumulator that starts out absent:
//!
//! 1. A segment with a blank token ends the walk; the accumulator so far is
//!    the result.
//! 2. Every segment after the first must accept the previous one
//!    (`can_follow`), else [`Error::InvalidSegmentContext`].
//! 3. The segment executes with the accumulator and the option map.
//! 4. The segment must accept its own result (`is_valid`), else
//!    [`Error::SegmentValidationFailed`].
//!
//! The first failure stops the walk; later segments never run.
//!
//! # Result shaping
//!
//! Applied in this order, each stage a no-op unless its option is present
//! and resolves an entity type from the segments the walk actually ran:
//!
//! 1. `$orderby` → `EntityType::sort`
//! 2. `$skip` / `$top` → `EntityType::limit`
//! 3. `$filter` → `EntityType::filter`
//!
//! Filtering runs on the already ordered and limited rows. A lazy relation
//! left over at the end is materialized.

use super::Query;
use crate::data::Resource;
use crate::error::{Error, Result};
use crate::options::{OptionKey, QueryOption};
use crate::segments::Segment;
use crate::services::Limits;
use tracing::{debug, info, instrument, warn};

/// Executes one query
#[derive(Debug)]
pub struct QueryExecutor<'q> {
    query: &'q Query,
}

impl<'q> QueryExecutor<'q> {
    pub fn new(query: &'q Query) -> Self {
        Self { query }
    }

    /// Walk the segments and shape the result
    #[instrument(skip(self), fields(uri = %self.query.to_uri()))]
    pub fn execute(&self) -> Result<Option<Resource>> {
        let (results, ran) = self.walk()?;
        let walked = &self.query.segments()[..ran];
        let results = self.with_orderby_option(results, walked)?;
        let results = self.with_skip_and_top_options(results, walked)?;
        let results = self.with_filter_option(results, walked)?;

        let results = results.map(Resource::materialize).transpose()?;
        info!(
            found = results.is_some(),
            segments = self.query.segments().len(),
            "Query executed"
        );
        Ok(results)
    }

    /// The segment walk alone, without shaping.
    ///
    /// Returns the accumulator and how many segments ran before the walk
    /// ended.
    pub fn walk(&self) -> Result<(Option<Resource>, usize)> {
        let mut seen: Vec<&dyn Segment> = Vec::with_capacity(self.query.segments().len());
        let mut acc: Option<Resource> = None;

        for segment in self.query.segments() {
            let segment = segment.as_ref();

            if segment.value().trim().is_empty() {
                debug!(step = seen.len(), "Blank segment ends the walk");
                return Ok((acc, seen.len()));
            }

            if let Some(previous) = seen.last() {
                if !segment.can_follow(*previous) {
                    warn!(
                        segment = %segment.describe(),
                        previous = %previous.describe(),
                        "Segment cannot follow its predecessor"
                    );
                    return Err(Error::InvalidSegmentContext {
                        uri: self.query.to_uri(),
                        segment: segment.describe(),
                    });
                }
            }

            let results = segment.execute(acc, self.query.options())?;
            if !segment.is_valid(&results) {
                warn!(segment = %segment.describe(), "Segment result failed validation");
                return Err(Error::SegmentValidationFailed {
                    uri: self.query.to_uri(),
                    segment: segment.describe(),
                });
            }

            debug!(step = seen.len(), segment = %segment.describe(), "Segment executed");
            seen.push(segment);
            acc = results;
        }

        Ok((acc, seen.len()))
    }

    fn option(&self, key: &str) -> Option<&'q dyn QueryOption> {
        self.query.get_option(key)
    }

    fn with_orderby_option(
        &self,
        results: Option<Resource>,
        walked: &[Box<dyn Segment>],
    ) -> Result<Option<Resource>> {
        let Some(results) = results else {
            return Ok(None);
        };
        let Some(option) = self.option(OptionKey::ORDERBY).filter(|o| !o.is_blank()) else {
            return Ok(Some(results));
        };
        let pairs = option.pairs().unwrap_or_default();

        match option.entity_type(walked) {
            Some(entity_type) if !pairs.is_empty() => {
                debug!(entity_type = %entity_type.name(), orderby = %option.value(), "Applying $orderby");
                entity_type.sort(results, pairs).map(Some)
            }
            _ => Ok(Some(results)),
        }
    }

    fn with_skip_and_top_options(
        &self,
        results: Option<Resource>,
        walked: &[Box<dyn Segment>],
    ) -> Result<Option<Resource>> {
        let Some(results) = results else {
            return Ok(None);
        };
        let skip = self.option(OptionKey::SKIP);
        let top = self.option(OptionKey::TOP);

        let entity_type = [skip, top]
            .into_iter()
            .flatten()
            .find_map(|option| option.entity_type(walked));

        match entity_type {
            Some(entity_type) => {
                let limits = Limits {
                    skip: skip.and_then(|o| o.count()),
                    top: top.and_then(|o| o.count()),
                };
                debug!(entity_type = %entity_type.name(), ?limits, "Applying $skip/$top");
                entity_type.limit(results, limits).map(Some)
            }
            None => Ok(Some(results)),
        }
    }

    fn with_filter_option(
        &self,
        results: Option<Resource>,
        walked: &[Box<dyn Segment>],
    ) -> Result<Option<Resource>> {
        let Some(results) = results else {
            return Ok(None);
        };
        let Some(option) = self.option(OptionKey::FILTER) else {
            return Ok(Some(results));
        };

        match option.entity_type(walked) {
            Some(entity_type) => {
                debug!(entity_type = %entity_type.name(), filter = %option.value(), "Applying $filter");
                entity_type.filter(results, option).map(Some)
            }
            None => Ok(Some(results)),
        }
    }
}
