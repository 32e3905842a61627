//! iatigraph core library.
//!
//! The transformation layer of the pipeline: pure, deterministic
//! set-oriented functions that turn raw IATI submissions into canonical
//! entities, phantom entities and aggregated edges. Every stage is a
//! function over full immutable snapshots of its inputs; re-running on
//! unchanged input produces identical output, with all derived rows
//! emitted in sorted key order.

pub mod canonical;
pub mod codelist;
pub mod error;
pub mod financial;
pub mod hierarchy;
pub mod participation;
pub mod phantom;
pub mod pipeline;

pub use error::{IatiGraphError, IatiGraphResult};
pub use pipeline::{run_transform, TransformSummary};

/// Treat null and empty-string identifiers alike: both mean "absent".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
