//! Lazy, on-demand traversal of the call graph.
//!
//! Renderers drive the tree through `TreeCursor`: ask a node for its ordered
//! child keys, build only the children they want to show, and walk back up
//! through `parent`. Nothing below a collapsed node is ever materialized.

pub mod display;
pub mod node;

use crate::parser::schema::Location;
use crate::utils::error::TreeError;

pub use display::{truncate_path, DisplayFields, Stripe};
pub use node::TreeNode;

/// Minimal tree-cursor protocol consumed by renderers
pub trait TreeCursor<'g>: Sized {
    /// `None` for a root
    fn parent(&self) -> Option<&Self>;

    /// Child locations by descending cumulative time, ties by location.
    /// Recomputed on every call.
    fn child_keys(&self) -> Vec<&'g Location>;

    /// Node for a key returned by `child_keys`
    fn child(&self, key: &Location) -> Result<Self, TreeError>;

    fn display_fields(&self) -> DisplayFields;

    fn location(&self) -> &'g Location;

    /// Root is 0
    fn depth(&self) -> usize;

    /// All children in `child_keys` order
    fn children(&self) -> Result<Vec<Self>, TreeError> {
        self.child_keys()
            .into_iter()
            .map(|key| self.child(key))
            .collect()
    }

    /// True when this location already appears higher up on the path.
    ///
    /// The graph keeps cycles as they are; renderers must show such a node as
    /// a terminal leaf instead of expanding it.
    fn is_recursive(&self) -> bool {
        let location = self.location();
        let mut current = self.parent();
        while let Some(node) = current {
            if node.location() == location {
                return true;
            }
            current = node.parent();
        }
        false
    }

    fn stripe(&self) -> Stripe {
        Stripe::for_depth(self.depth())
    }
}
