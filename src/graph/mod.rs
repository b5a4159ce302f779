//! Call graph reconstruction.
//!
//! This module turns the flat location -> stats mapping into:
//! - One immutable `Record` per profiled function
//! - Parent -> children links inverted from the caller relation
//! - The set of root records (no incoming calls)

pub mod builder;
pub mod call_graph;
pub mod record;

// Re-export main types and functions
pub use builder::build_call_graph;
pub use call_graph::CallGraph;
pub use record::{Record, RecordId};
