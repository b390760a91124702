//! In-memory relational tables.
//!
//! Tables of rows keyed by header, with filtering, set operations, hash
//! joins, grouping with streaming aggregates and pivots. Tables can be
//! streamed lazily, indexed into nested hierarchies and diffed against each
//! other.

pub mod aggregate;
pub mod column;
pub mod config;
pub mod criterion;
pub mod diff;
pub mod format;
pub mod hash;
pub mod hierarchy;
pub mod ingest;
pub mod row;
pub mod stream;
pub mod table;
pub mod value;

pub use self::aggregate::{AggregateMethod, Aggregations};
pub use self::config::EngineConfig;
pub use self::criterion::{ColumnMutation, FilterCriterion};
pub use self::diff::{DiffResult, ResultSet, diff};
pub use self::hierarchy::Hierarchy;
pub use self::row::Row;
pub use self::stream::TableStream;
pub use self::table::{JoinOptions, JoinType, Table};
pub use self::value::Value;
