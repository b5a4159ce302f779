//! Flamegraph generation using the inferno library.
//!
//! The call tree is walked into collapsed stacks, which inferno renders as
//! an SVG flamegraph.

pub mod generator;
pub mod stacks;

pub use generator::{generate_flamegraph, FlamegraphConfig};
pub use stacks::{build_collapsed_stacks, CollapsedStack};
