//! End-to-end tests for query construction and execution

use odata_query::data::{Datum, FilterExpr, Relation, Resource};
use odata_query::error::{Error, Result};
use odata_query::options::{
    FilterOption, OptionKind, OptionMap, OrderByOption, OrderPair, QueryOption, TopOption,
};
use odata_query::segments::{Segment, SegmentKind};
use odata_query::services::{DataServices, EntityType, InMemoryDataServices, Limits};
use odata_query::{Query, QueryCompiler};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn northwind() -> Arc<dyn DataServices> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/northwind.json");
    Arc::new(InMemoryDataServices::load(&path).expect("Failed to load fixture dataset"))
}

fn names(result: Option<Resource>) -> Vec<String> {
    match result {
        Some(Resource::Collection(rows)) => rows
            .iter()
            .filter_map(|r| r.get("Name").and_then(|n| n.as_string()).map(str::to_string))
            .collect(),
        other => panic!("Expected materialized collection, got {:?}", other),
    }
}

// ============================================================================
// Segment walk
// ============================================================================

#[test]
fn test_empty_query_returns_absent_result() {
    let query = Query::new(northwind());
    assert!(query.execute().unwrap().is_none());
    assert_eq!(query.resource_path(), "");
}

#[test]
fn test_entity_set_is_materialized() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Categories".into()]).unwrap();

    let result = query.execute().unwrap();
    assert_eq!(names(result), vec!["Bakery", "Dairy", "Beverages"]);
}

#[test]
fn test_key_navigation_and_property() {
    let services = northwind();

    let mut query = Query::new(Arc::clone(&services));
    query.segment(SegmentKind::EntitySet, &["Products".into()]).unwrap();
    query.segment(SegmentKind::Key, &[3.into()]).unwrap();
    query.segment(SegmentKind::Navigation, &["Category".into()]).unwrap();
    query.segment(SegmentKind::Property, &["Name".into()]).unwrap();
    query.segment(SegmentKind::Value, &[]).unwrap();

    assert_eq!(query.to_uri(), "Products/3/Category/Name/$value");
    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::from("Dairy")));
}

#[test]
fn test_navigation_to_many_is_shaped() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Categories".into()]).unwrap();
    query.segment_tag("Key", &[2.into()]).unwrap();
    query.segment_tag("Navigation", &["Products".into()]).unwrap();
    query.option_tag("$orderby", &["Price desc".into()]).unwrap();
    query.option_tag("$top", &[2.into()]).unwrap();

    assert_eq!(names(query.execute().unwrap()), vec!["Cheese", "Eggs"]);
}

#[test]
fn test_count() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Products".into()]).unwrap();
    query.segment_tag("Count", &[]).unwrap();

    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::Number(7.0)));
}

#[test]
fn test_missing_key_fails_validation() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Products".into()]).unwrap();
    query.segment_tag("Key", &[99.into()]).unwrap();

    match query.execute().unwrap_err() {
        Error::SegmentValidationFailed { uri, segment } => {
            assert_eq!(uri, "Products/99");
            assert_eq!(segment, "Key(99)");
        }
        other => panic!("Expected SegmentValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_illegal_chain_is_rejected() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Products".into()]).unwrap();
    query.segment_tag("Value", &[]).unwrap();

    match query.execute().unwrap_err() {
        Error::InvalidSegmentContext { uri, segment } => {
            assert_eq!(uri, "Products/$value");
            assert_eq!(segment, "Value($value)");
        }
        other => panic!("Expected InvalidSegmentContext, got {:?}", other),
    }
}

/// Segment that counts its executions
#[derive(Debug)]
struct Tracked {
    token: &'static str,
    follows: bool,
    runs: Arc<AtomicUsize>,
}

impl Tracked {
    fn boxed(token: &'static str, follows: bool, runs: &Arc<AtomicUsize>) -> Box<dyn Segment> {
        Box::new(Tracked {
            token,
            follows,
            runs: Arc::clone(runs),
        })
    }
}

impl Segment for Tracked {
    fn kind(&self) -> SegmentKind {
        SegmentKind::Custom
    }

    fn value(&self) -> String {
        self.token.to_string()
    }

    fn can_follow(&self, _previous: &dyn Segment) -> bool {
        self.follows
    }

    fn execute(&self, _acc: Option<Resource>, _options: &OptionMap) -> Result<Option<Resource>> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Resource::Value(Datum::from(self.token))))
    }

    fn is_valid(&self, result: &Option<Resource>) -> bool {
        result.is_some()
    }
}

#[test]
fn test_chain_failure_stops_the_walk() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut query = Query::new(northwind());
    query.push_segment(Tracked::boxed("a", true, &runs));
    query.push_segment(Tracked::boxed("b", true, &runs));
    query.push_segment(Tracked::boxed("c", false, &runs));
    query.push_segment(Tracked::boxed("d", true, &runs));

    let err = query.execute().unwrap_err();
    assert!(matches!(err, Error::InvalidSegmentContext { ref segment, .. } if segment == "Custom(c)"));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_first_segment_needs_no_predecessor() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut query = Query::new(northwind());
    query.push_segment(Tracked::boxed("only", false, &runs));

    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::from("only")));
}

#[test]
fn test_blank_segment_short_circuits() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut query = Query::new(northwind());
    query.push_segment(Tracked::boxed("a", true, &runs));
    query.push_segment(Tracked::boxed("  ", true, &runs));
    query.push_segment(Tracked::boxed("c", false, &runs));

    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::from("a")));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Result shaping
// ============================================================================

/// Entity type over bare numbers that records which shaping stages ran
#[derive(Debug, Default)]
struct Numbers {
    calls: Mutex<Vec<&'static str>>,
}

fn numbers_of(results: Resource) -> Vec<f64> {
    results
        .rows()
        .unwrap()
        .unwrap_or_default()
        .iter()
        .filter_map(Datum::as_number)
        .collect()
}

fn wrap(n: f64) -> Datum {
    Datum::from(serde_json::json!({ "value": n }))
}

impl EntityType for Numbers {
    fn name(&self) -> &str {
        "Numbers"
    }

    fn key_property(&self) -> &str {
        "value"
    }

    fn all(&self) -> Result<Resource> {
        Ok(Resource::Relation(Relation::new("Numbers", || {
            Ok(vec![Datum::Number(3.0), Datum::Number(1.0), Datum::Number(2.0)])
        })))
    }

    fn filter(&self, results: Resource, filter: &dyn QueryOption) -> Result<Resource> {
        self.calls.lock().push("filter");
        let expr = filter.filter_expr().expect("filter option carries an expression");
        Ok(Resource::Collection(
            numbers_of(results)
                .into_iter()
                .filter(|n| expr.matches(&wrap(*n)))
                .map(Datum::Number)
                .collect(),
        ))
    }

    fn sort(&self, results: Resource, pairs: &[OrderPair]) -> Result<Resource> {
        self.calls.lock().push("sort");
        let mut values = numbers_of(results);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        if pairs[0].direction == odata_query::options::Direction::Desc {
            values.reverse();
        }
        Ok(Resource::Collection(values.into_iter().map(Datum::Number).collect()))
    }

    fn limit(&self, results: Resource, limits: Limits) -> Result<Resource> {
        self.calls.lock().push("limit");
        Ok(Resource::Collection(
            numbers_of(results)
                .into_iter()
                .skip(limits.skip.unwrap_or(0))
                .take(limits.top.unwrap_or(usize::MAX))
                .map(Datum::Number)
                .collect(),
        ))
    }
}

#[derive(Debug, Default)]
struct NumberServices {
    numbers: Arc<Numbers>,
}

impl DataServices for NumberServices {
    fn entity_type(&self, entity_set: &str) -> Option<Arc<dyn EntityType>> {
        (entity_set == "Numbers").then(|| Arc::clone(&self.numbers) as Arc<dyn EntityType>)
    }

    fn entity_sets(&self) -> Vec<String> {
        vec!["Numbers".to_string()]
    }
}

fn numbers_query() -> (Query, Arc<Numbers>) {
    let services = NumberServices::default();
    let numbers = Arc::clone(&services.numbers);
    let mut query = Query::new(Arc::new(services));
    query.segment(SegmentKind::EntitySet, &["Numbers".into()]).unwrap();
    (query, numbers)
}

fn values(result: Option<Resource>) -> Vec<f64> {
    numbers_of(result.expect("query produced a result"))
}

#[test]
fn test_no_shaping_options_returns_raw_rows() {
    let (query, numbers) = numbers_query();

    let result = query.execute().unwrap();
    assert!(matches!(result, Some(Resource::Collection(_))));
    assert_eq!(values(result), vec![3.0, 1.0, 2.0]);
    assert!(numbers.calls.lock().is_empty());
}

#[test]
fn test_orderby_precedes_filter() {
    let (mut query, numbers) = numbers_query();
    query.option(OptionKind::OrderBy, &["value".into()]).unwrap();
    query.push_option(Box::new(FilterOption::new(FilterExpr::ne("value", 1))));

    assert_eq!(values(query.execute().unwrap()), vec![2.0, 3.0]);
    assert_eq!(*numbers.calls.lock(), vec!["sort", "filter"]);
}

#[test]
fn test_pipeline_order_is_orderby_limit_filter() {
    let (mut query, numbers) = numbers_query();
    query.option(OptionKind::Filter, &[serde_json::json!(["ne", "value", 3]).into()]).unwrap();
    query.option(OptionKind::Top, &[2.into()]).unwrap();
    query.option(OptionKind::OrderBy, &["value desc".into()]).unwrap();

    // [3,1,2] → sort desc [3,2,1] → top 2 [3,2] → filter ≠3 [2]
    assert_eq!(values(query.execute().unwrap()), vec![2.0]);
    assert_eq!(*numbers.calls.lock(), vec!["sort", "limit", "filter"]);
}

#[test]
fn test_skip_alone_triggers_limit() {
    let (mut query, numbers) = numbers_query();
    query.option(OptionKind::Skip, &[1.into()]).unwrap();

    assert_eq!(values(query.execute().unwrap()), vec![1.0, 2.0]);
    assert_eq!(*numbers.calls.lock(), vec!["limit"]);
}

#[test]
fn test_render_only_options_do_not_shape() {
    let (mut query, numbers) = numbers_query();
    query.option(OptionKind::Select, &["value".into()]).unwrap();
    query.option(OptionKind::Format, &["json".into()]).unwrap();

    assert_eq!(values(query.execute().unwrap()), vec![3.0, 1.0, 2.0]);
    assert!(numbers.calls.lock().is_empty());
}

#[test]
fn test_shaping_skips_single_values() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Products".into()]).unwrap();
    query.segment_tag("Key", &[1.into()]).unwrap();
    query.push_option(Box::new(TopOption::new(0)));

    let result = query.execute().unwrap();
    assert_eq!(
        result.and_then(|r| r.as_value().and_then(|e| e.get("Name")).cloned()),
        Some(Datum::from("Bread"))
    );
}

#[test]
fn test_blank_orderby_does_not_sort() {
    let (mut query, numbers) = numbers_query();
    query.push_option(Box::new(OrderByOption::new(Vec::new())));

    assert_eq!(values(query.execute().unwrap()), vec![3.0, 1.0, 2.0]);
    assert!(numbers.calls.lock().is_empty());
}

#[test]
fn test_blank_segment_keeps_shaping_on_the_walked_path() {
    let runs = Arc::new(AtomicUsize::new(0));

    let (mut plain, _) = numbers_query();
    plain.option(OptionKind::Top, &[1.into()]).unwrap();

    let (mut cut_short, numbers) = numbers_query();
    cut_short.push_segment(Tracked::boxed(" ", true, &runs));
    cut_short.option(OptionKind::Top, &[1.into()]).unwrap();
    cut_short.option(OptionKind::OrderBy, &["value".into()]).unwrap();

    assert_eq!(values(plain.execute().unwrap()), vec![3.0]);
    assert_eq!(values(cut_short.execute().unwrap()), vec![1.0]);
    assert_eq!(*numbers.calls.lock(), vec!["sort", "limit"]);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_single_entity_ignores_filter_and_orderby() {
    let mut query = Query::new(northwind());
    query.segment_tag("EntitySet", &["Products".into()]).unwrap();
    query.segment_tag("Key", &[1.into()]).unwrap();
    query.option_tag("$filter", &[serde_json::json!(["eq", "Name", "Milk"]).into()]).unwrap();
    query.option_tag("$orderby", &["Price desc".into()]).unwrap();

    let entity = query.execute().unwrap().unwrap().into_datum().unwrap();
    assert_eq!(entity.get("ID"), Some(&Datum::Number(1.0)));
    assert_eq!(entity.get("Name"), Some(&Datum::from("Bread")));
}

#[test]
fn test_path_without_entity_type_is_not_shaped() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut query = Query::new(northwind());
    query.push_segment(Tracked::boxed("only", false, &runs));
    query.option(OptionKind::OrderBy, &["Name".into()]).unwrap();
    query.option(OptionKind::Top, &[0.into()]).unwrap();
    query.option(OptionKind::Filter, &[serde_json::json!(["eq", "Name", "x"]).into()]).unwrap();

    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::from("only")));
}

#[test]
fn test_upserted_option_drives_shaping() {
    let (mut query, _numbers) = numbers_query();
    query.option(OptionKind::Top, &[1.into()]).unwrap();
    query.option(OptionKind::Top, &[2.into()]).unwrap();

    assert_eq!(query.options().len(), 1);
    assert_eq!(values(query.execute().unwrap()), vec![3.0, 1.0]);
}

// ============================================================================
// Compiled queries against the fixture dataset
// ============================================================================

#[test]
fn test_compiled_query_end_to_end() {
    let json = serde_json::json!({
        "segments": [["EntitySet", "Products"]],
        "options": {
            "$orderby": "Price",
            "$skip": 1,
            "$top": 4,
            "$filter": ["lt", "Price", 3]
        }
    });
    let query = QueryCompiler::compile(northwind(), &json).unwrap();

    // Price asc: Milk 1.0, Cola 1.25, Bagel 1.5, Bread 2.5, Eggs 3.0, Cheese 7.0, Apple Pie 9.0
    // skip 1, top 4: Cola, Bagel, Bread, Eggs
    // filter Price lt 3: Cola, Bagel, Bread
    assert_eq!(names(query.execute().unwrap()), vec!["Cola", "Bagel", "Bread"]);
}

#[test]
fn test_compiled_query_renders_uri() {
    let json = serde_json::json!({
        "segments": [["EntitySet", "Products"], ["Key", 7]],
        "options": {"$select": "Name"}
    });
    let query = QueryCompiler::compile(northwind(), &json).unwrap();
    assert_eq!(query.to_uri(), "Products/7?$select=Name");

    let result = query.execute().unwrap().unwrap().into_datum().unwrap();
    assert_eq!(result.get("Name"), Some(&Datum::from("Apple Pie")));
}

#[test]
fn test_string_keys_render_quoted() {
    let services = InMemoryDataServices::new();
    services
        .define_entity_set(odata_query::services::EntitySetSchema::new("Customers", "Code"))
        .unwrap();
    services
        .insert("Customers", serde_json::json!({"Code": "ALFKI", "Name": "Alfreds"}).into())
        .unwrap();

    let mut query = Query::new(Arc::new(services));
    query.segment_tag("EntitySet", &["Customers".into()]).unwrap();
    query.segment_tag("Key", &["ALFKI".into()]).unwrap();
    query.segment_tag("Property", &["Name".into()]).unwrap();

    assert_eq!(query.to_uri(), "Customers/'ALFKI'/Name");
    let result = query.execute().unwrap();
    assert_eq!(result.and_then(|r| r.as_value().cloned()), Some(Datum::from("Alfreds")));
}
