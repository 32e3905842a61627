//! # IATI Graph · Neo4j loading
//!
//! Loads the derived relational tables into a Neo4j property graph:
//! node labels for published and phantom entities, relationship types
//! for participation, finance, funding and hierarchy.

pub mod client;
pub mod load;
pub mod schema;
pub mod wipe;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use load::{run_full_load, LoadResult};
