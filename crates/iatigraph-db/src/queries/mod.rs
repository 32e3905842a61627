//! Query modules, grouped by table family.

pub mod entities;
pub mod links;
pub mod meta;
pub mod source;
