//! iatigraph database layer.
//!
//! SQLite store holding both the raw IATI source tables (populated by
//! an external ingest) and the derived entity/edge tables produced by
//! the transformation pipeline. Derived tables are always replaced as
//! a whole; downstream consumers never observe a partial table.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{DbError, DbPool, DbResult};
