//! Build collapsed stack format by walking the call tree.
//!
//! Format: "root;child;grandchild weight"
//!
//! Example: "main (a.py:1);work (a.py:9) 1500"
//! This means: main called work, which spent 1500µs of its own time there.

use crate::graph::Record;
use crate::tree::{TreeCursor, TreeNode};
use crate::utils::config::{MAX_COLLAPSED_STACKS, MICROS_PER_SECOND};
use crate::utils::error::TreeError;
use log::{debug, warn};

/// A single collapsed stack entry
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedStack {
    /// Frames joined by `;`
    pub stack: String,

    /// Self time at the last frame, in microseconds
    pub weight: u64,
}

impl CollapsedStack {
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Line in the folded format read by flamegraph tools
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Collect one stack per root-to-node path
///
/// **Public** - main entry point for stack building
///
/// A path ends at a cycle node, at `max_depth`, or at a leaf. Stacks are
/// sorted by weight (descending). The walk gives up after
/// `MAX_COLLAPSED_STACKS` stacks.
pub fn build_collapsed_stacks(
    roots: &[TreeNode<'_>],
    max_depth: usize,
) -> Result<Vec<CollapsedStack>, TreeError> {
    let mut walker = StackWalker {
        frames: Vec::new(),
        stacks: Vec::new(),
        max_depth,
        capped: false,
    };

    for root in roots {
        walker.visit(root)?;
        if walker.capped {
            break;
        }
    }

    if walker.capped {
        warn!(
            "Stopped collecting flamegraph stacks at {}; the graph has too many distinct paths",
            MAX_COLLAPSED_STACKS
        );
    }

    let mut stacks = walker.stacks;
    stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));

    debug!("Built {} collapsed stacks", stacks.len());
    Ok(stacks)
}

struct StackWalker {
    frames: Vec<String>,
    stacks: Vec<CollapsedStack>,
    max_depth: usize,
    capped: bool,
}

impl StackWalker {
    fn visit(&mut self, node: &TreeNode<'_>) -> Result<(), TreeError> {
        if self.stacks.len() >= MAX_COLLAPSED_STACKS {
            self.capped = true;
            return Ok(());
        }

        self.frames.push(frame_name(node));

        let weight = to_micros(path_self_time(node));
        if weight > 0 {
            self.stacks
                .push(CollapsedStack::new(self.frames.join(";"), weight));
        }

        if !node.is_recursive() && node.depth() + 1 < self.max_depth {
            for key in node.child_keys() {
                self.visit(&node.child(key)?)?;
                if self.capped {
                    break;
                }
            }
        }

        self.frames.pop();
        Ok(())
    }
}

/// `function (file:line)` with the stack separator stripped out
fn frame_name(node: &TreeNode<'_>) -> String {
    let fields = node.display_fields();
    format!("{} ({}:{})", fields.function, fields.filename, fields.line).replace(';', ":")
}

/// Self time spent in this node when reached through its parent
///
/// A root owns all of its self time. A child gets the time recorded on the
/// edge from its parent; when the edge only carries a call count, the self
/// time is split by that count.
fn path_self_time(node: &TreeNode<'_>) -> f64 {
    let record = node.record();
    let Some(parent) = node.parent() else {
        return record.self_time;
    };

    match record.edge_from(parent.location()) {
        Some(edge) if edge.self_time > 0.0 || edge.cumulative_time > 0.0 => edge.self_time,
        Some(edge) => share_by_calls(record, edge.call_count),
        None => record.self_time,
    }
}

fn share_by_calls(record: &Record, calls: u64) -> f64 {
    if record.call_count == 0 {
        return 0.0;
    }
    record.self_time * calls as f64 / record.call_count as f64
}

fn to_micros(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * MICROS_PER_SECOND).round() as u64
    } else {
        0
    }
}
