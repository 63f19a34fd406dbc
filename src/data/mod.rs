//! Value model shared by segments, options and data services.
//!
//! - **Datum**: JSON-like values (entities, keys, property values)
//! - **Resource**: the accumulator a segment walk produces
//! - **FilterExpr**: structured `$filter` predicates

pub mod datum;
pub mod filter;
pub mod resource;

pub use datum::Datum;
pub use filter::{Comparison, FilterExpr};
pub use resource::{Relation, Resource};
