// OData Query - Rust Implementation
// Resource path construction and query execution over pluggable data services

#![warn(rust_2018_idioms)]

pub mod config;
pub mod data;
pub mod options;
pub mod query;
pub mod segments;
pub mod services;

// Re-exports for convenience
pub use data::{Datum, FilterExpr, Resource};
pub use options::{OptionKey, OptionKind, QueryOption};
pub use query::{Query, QueryCompiler};
pub use segments::{Segment, SegmentKind};
pub use services::{DataServices, EntityType, InMemoryDataServices};

/// OData query error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Unknown {family} variant: {tag}")]
        UnknownVariant { family: &'static str, tag: String },

        #[error("Invalid segment context: {segment} cannot follow in '{uri}'")]
        InvalidSegmentContext { uri: String, segment: String },

        #[error("Segment {segment} failed validation after execution in '{uri}'")]
        SegmentValidationFailed { uri: String, segment: String },

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Not found: {0}")]
        NotFound(String),

        #[error("Backend error: {0}")]
        Backend(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Serialization error: {0}")]
        SerializationError(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
