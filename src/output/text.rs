//! Plain-text call tree, one row per node.

use crate::tree::TreeCursor;
use crate::utils::config::MAX_TREE_NODES;
use crate::utils::error::TreeError;
use log::warn;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render every root and its descendants down to `max_depth`
///
/// **Public** - used by the `--print` mode
///
/// Nodes that re-enter a location already on their path are printed once,
/// tagged `[cycle]`, and not expanded. Nodes cut off by the depth bound are
/// tagged `[+N]` with their number of hidden children. At most
/// `MAX_TREE_NODES` rows are written; the walk ends with a marker line when
/// that budget runs out.
pub fn render_text_tree<'g, C: TreeCursor<'g>>(
    roots: &[C],
    max_depth: usize,
) -> Result<String, TreeError> {
    render_limited(roots, max_depth, MAX_TREE_NODES)
}

fn render_limited<'g, C: TreeCursor<'g>>(
    roots: &[C],
    max_depth: usize,
    max_nodes: usize,
) -> Result<String, TreeError> {
    let mut walker = TextWalker {
        out: String::new(),
        max_depth,
        remaining: max_nodes,
        capped: false,
    };
    let _ = writeln!(
        walker.out,
        "{:>12} {:>12} {:>9}  function",
        "cumtime", "tottime", "ncalls"
    );

    for root in roots {
        walker.visit(root)?;
        if walker.capped {
            break;
        }
    }

    if walker.capped {
        warn!(
            "Stopped printing the call tree after {} rows; use --max-depth to narrow it",
            max_nodes
        );
        let _ = writeln!(walker.out, "[output truncated after {} rows]", max_nodes);
    }
    Ok(walker.out)
}

struct TextWalker {
    out: String,
    max_depth: usize,
    remaining: usize,
    capped: bool,
}

impl TextWalker {
    fn visit<'g, C: TreeCursor<'g>>(&mut self, node: &C) -> Result<(), TreeError> {
        if self.remaining == 0 {
            self.capped = true;
            return Ok(());
        }
        self.remaining -= 1;

        let fields = node.display_fields();
        let _ = write!(
            self.out,
            "{:>12.6} {:>12.6} {:>9}  {}{}",
            fields.cumulative_time,
            fields.self_time,
            fields.call_count,
            INDENT.repeat(node.depth()),
            fields.label()
        );

        if node.is_recursive() {
            self.out.push_str(" [cycle]\n");
            return Ok(());
        }

        let keys = node.child_keys();
        if !keys.is_empty() && (node.depth() + 1 >= self.max_depth || self.remaining == 0) {
            let _ = writeln!(self.out, " [+{}]", keys.len());
            self.capped |= self.remaining == 0;
            return Ok(());
        }
        self.out.push('\n');

        for key in keys {
            self.visit(&node.child(key)?)?;
            if self.capped {
                break;
            }
        }
        Ok(())
    }
}
