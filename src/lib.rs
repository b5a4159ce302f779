//! Steelix
//!
//! Call-tree reconstruction and browsing for flat function profiles.
//!
//! A profile lists, for every function, its call count, self time,
//! cumulative time and which functions called it. Steelix inverts those
//! caller edges into a graph, picks the functions nobody calls as roots,
//! and exposes the result as lazily expanded tree nodes that any renderer
//! can walk.
//!
//! ## Getting Started
//!
//! ```bash
//! steelix program.prof            # interactive browser
//! steelix --print program.prof    # indented text tree
//! steelix --flamegraph flame.svg program.prof
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use steelix::graph::build_call_graph;
//! use steelix::parser::{load_profile, InputFormat};
//! use steelix::tree::{TreeCursor, TreeNode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = load_profile("program.prof", InputFormat::Auto)?;
//! let graph = build_call_graph(&data)?;
//! for root in TreeNode::roots(&graph) {
//!     println!("{} -> {:?}", root.display_fields().label(), root.child_keys());
//! }
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod commands;
pub mod flamegraph;
pub mod graph;
pub mod output;
pub mod parser;
pub mod tree;
pub mod utils;
