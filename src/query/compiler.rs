//! Query Compiler.
//!
//! Builds a [`Query`] from its JSON description.
//!
//! # Format
//!
//! ```json
//! {
//!   "segments": [["EntitySet", "Products"], ["Key", 7], "Count"],
//!   "options": {"$filter": ["gt", "Price", 5], "$orderby": "Name desc", "Top": 10}
//! }
//! ```
//!
//! - Each segment is `[tag, args...]`, or a bare tag when it takes no
//!   arguments.
//! - Each option maps a tag (variant name or canonical key) to its single
//!   argument.
//!
//! Tags resolve through the segment and option registries, so an unknown tag
//! fails with [`Error::UnknownVariant`](crate::error::Error::UnknownVariant).

use super::Query;
use crate::data::Datum;
use crate::error::{Error, Result};
use crate::services::DataServices;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Compiler for JSON query descriptions
pub struct QueryCompiler;

impl QueryCompiler {
    /// Compile a JSON value into a query against `services`
    #[instrument(skip(services, json))]
    pub fn compile(services: Arc<dyn DataServices>, json: &Value) -> Result<Query> {
        let obj = json
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("query description must be an object".to_string()))?;

        if let Some(unknown) = obj.keys().find(|k| *k != "segments" && *k != "options") {
            return Err(Error::InvalidArgument(format!(
                "unexpected field '{}' in query description",
                unknown
            )));
        }

        let mut query = Query::new(services);

        if let Some(segments) = obj.get("segments") {
            let segments = segments
                .as_array()
                .ok_or_else(|| Error::InvalidArgument("'segments' must be an array".to_string()))?;
            for segment in segments {
                let (tag, args) = Self::split_segment(segment)?;
                query.segment_tag(&tag, &args)?;
            }
        }

        if let Some(options) = obj.get("options") {
            let options = options
                .as_object()
                .ok_or_else(|| Error::InvalidArgument("'options' must be an object".to_string()))?;
            for (tag, arg) in options {
                query.option_tag(tag, &[Datum::from(arg.clone())])?;
            }
        }

        debug!(uri = %query.to_uri(), "Compiled query");
        Ok(query)
    }

    /// Parse and compile JSON text
    pub fn compile_str(services: Arc<dyn DataServices>, text: &str) -> Result<Query> {
        let json: Value =
            serde_json::from_str(text).map_err(|e| Error::SerializationError(e.to_string()))?;
        Self::compile(services, &json)
    }

    fn split_segment(segment: &Value) -> Result<(String, Vec<Datum>)> {
        match segment {
            Value::String(tag) => Ok((tag.clone(), Vec::new())),
            Value::Array(parts) => {
                let tag = parts.first().and_then(Value::as_str).ok_or_else(|| {
                    Error::InvalidArgument(format!("segment must start with a tag: {}", segment))
                })?;
                let args = parts[1..].iter().cloned().map(Datum::from).collect();
                Ok((tag.to_string(), args))
            }
            other => Err(Error::InvalidArgument(format!(
                "segment must be a tag or [tag, args...], got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{EntitySetSchema, InMemoryDataServices};

    fn services() -> Arc<dyn DataServices> {
        let services = InMemoryDataServices::new();
        services
            .define_entity_set(EntitySetSchema::new("Products", "ID"))
            .unwrap();
        Arc::new(services)
    }

    #[test]
    fn test_compile_path_and_options() {
        let json = serde_json::json!({
            "segments": [["EntitySet", "Products"], ["Key", 7]],
            "options": {"$select": "Name"}
        });
        let query = QueryCompiler::compile(services(), &json).unwrap();
        assert_eq!(query.to_uri(), "Products/7?$select=Name");
    }

    #[test]
    fn test_compile_bare_tags_and_option_names() {
        let json = serde_json::json!({
            "segments": [["Collection", "Products"], "Count"],
            "options": {"Top": 3, "filter": ["eq", "Name", "Bread"]}
        });
        let query = QueryCompiler::compile(services(), &json).unwrap();
        assert_eq!(query.resource_path(), "Products/$count");
        assert_eq!(query.get_option("$top").and_then(|o| o.count()), Some(3));
        assert_eq!(
            query.get_option("$filter").map(|o| o.value()),
            Some("Name eq 'Bread'".to_string())
        );
    }

    #[test]
    fn test_compile_unknown_tags() {
        let json = serde_json::json!({"segments": [["NoSuchKind"]]});
        let err = QueryCompiler::compile(services(), &json).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { family: "segment", .. }));

        let json = serde_json::json!({"options": {"$search": "bread"}});
        let err = QueryCompiler::compile(services(), &json).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { family: "option", .. }));
    }

    #[test]
    fn test_compile_rejects_malformed_descriptions() {
        let cases = [
            serde_json::json!([["EntitySet", "Products"]]),
            serde_json::json!({"segments": "Products"}),
            serde_json::json!({"segments": [[7]]}),
            serde_json::json!({"segments": [{"EntitySet": "Products"}]}),
            serde_json::json!({"options": ["$top", 1]}),
            serde_json::json!({"segments": [], "limit": 1}),
        ];
        for case in cases {
            let err = QueryCompiler::compile(services(), &case).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{} -> {:?}", case, err);
        }
    }

    #[test]
    fn test_compile_str_reports_bad_json() {
        let err = QueryCompiler::compile_str(services(), "{segments").unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
