//! Lazy cursor over the call graph.

use super::display::DisplayFields;
use super::TreeCursor;
use crate::graph::builder::by_cumulative_time;
use crate::graph::{CallGraph, Record, RecordId};
use crate::parser::schema::Location;
use crate::utils::config::DEFAULT_PATH_DEPTH;
use crate::utils::error::TreeError;
use std::fmt;
use std::rc::Rc;

/// One position in the call tree
///
/// A node only knows its record, the node that produced it and its depth.
/// Children are derived from the graph on every request, so a node can be
/// dropped and rebuilt at any time without losing anything.
#[derive(Clone)]
pub struct TreeNode<'g> {
    graph: &'g CallGraph,
    id: RecordId,
    parent: Option<Rc<TreeNode<'g>>>,
    depth: usize,
    path_depth: usize,
}

impl<'g> TreeNode<'g> {
    /// Top-level node for `id`
    pub fn root(graph: &'g CallGraph, id: RecordId) -> Self {
        Self {
            graph,
            id,
            parent: None,
            depth: 0,
            path_depth: DEFAULT_PATH_DEPTH,
        }
    }

    /// One node per graph root, in root order
    pub fn roots(graph: &'g CallGraph) -> Vec<Self> {
        graph
            .roots()
            .iter()
            .map(|id| Self::root(graph, *id))
            .collect()
    }

    /// Filename segments kept by `display_fields`, inherited by children
    pub fn with_path_depth(mut self, path_depth: usize) -> Self {
        self.path_depth = path_depth;
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn record(&self) -> &'g Record {
        self.graph.record(self.id)
    }
}

impl<'g> TreeCursor<'g> for TreeNode<'g> {
    fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    fn child_keys(&self) -> Vec<&'g Location> {
        let graph = self.graph;
        let mut children: Vec<&'g Record> = self
            .record()
            .children()
            .map(|id| graph.record(id))
            .collect();
        children.sort_by(|a, b| by_cumulative_time(a, b));
        children.into_iter().map(|record| &record.location).collect()
    }

    fn child(&self, key: &Location) -> Result<Self, TreeError> {
        let id = self
            .graph
            .id_of(key)
            .filter(|id| self.record().has_child(*id))
            .ok_or_else(|| TreeError::InvalidChildKey {
                parent: self.location().clone(),
                key: key.clone(),
            })?;

        Ok(Self {
            graph: self.graph,
            id,
            parent: Some(Rc::new(self.clone())),
            depth: self.depth + 1,
            path_depth: self.path_depth,
        })
    }

    fn display_fields(&self) -> DisplayFields {
        DisplayFields::from_record(self.record(), self.path_depth)
    }

    fn location(&self) -> &'g Location {
        &self.record().location
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for TreeNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("location", self.location())
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_call_graph;
    use crate::parser::schema::{EdgeStats, ProfileData, RawStats};

    fn loc(line: u32, func: &str) -> Location {
        Location::new("/srv/app/pkg/mod/a.py", line, func)
    }

    // main -> {slow, fast, tie_b, tie_a}, slow -> leaf
    fn sample_graph() -> CallGraph {
        let edge = EdgeStats::from_count(1);
        let mut data = ProfileData::new();
        data.insert(loc(1, "main"), RawStats::leaf(1, 0.1, 10.0));
        data.insert(
            loc(2, "slow"),
            RawStats::leaf(1, 1.0, 6.0).with_caller(loc(1, "main"), edge),
        );
        data.insert(
            loc(3, "fast"),
            RawStats::leaf(1, 0.5, 0.5).with_caller(loc(1, "main"), edge),
        );
        data.insert(
            loc(5, "tie_b"),
            RawStats::leaf(1, 1.0, 1.0).with_caller(loc(1, "main"), edge),
        );
        data.insert(
            loc(4, "tie_a"),
            RawStats::leaf(1, 1.0, 1.0).with_caller(loc(1, "main"), edge),
        );
        data.insert(
            loc(6, "leaf"),
            RawStats::leaf(3, 5.0, 5.0).with_caller(loc(2, "slow"), edge),
        );
        build_call_graph(&data).unwrap()
    }

    #[test]
    fn test_child_keys_order() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0);
        let names: Vec<_> = root
            .child_keys()
            .iter()
            .map(|loc| loc.function.as_str())
            .collect();
        assert_eq!(names, vec!["slow", "tie_a", "tie_b", "fast"]);
    }

    #[test]
    fn test_child_sets_parent_and_depth() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0);
        let slow = root.child(&loc(2, "slow")).unwrap();
        let leaf = slow.child(&loc(6, "leaf")).unwrap();

        assert_eq!(slow.depth(), 1);
        assert_eq!(leaf.depth(), 2);
        assert_eq!(leaf.parent().unwrap().location(), &loc(2, "slow"));
        assert_eq!(
            leaf.parent().unwrap().parent().unwrap().location(),
            &loc(1, "main")
        );
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_invalid_child_key() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0);

        // A real record, but a grandchild rather than a child
        let err = root.child(&loc(6, "leaf")).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidChildKey {
                parent: loc(1, "main"),
                key: loc(6, "leaf"),
            }
        );

        assert!(root.child(&loc(99, "missing")).is_err());
    }

    #[test]
    fn test_display_fields_truncates_filename_only() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0);
        let fields = root.display_fields();

        assert_eq!(fields.filename, ".../pkg/mod/a.py");
        assert_eq!(fields.function, "main");
        assert_eq!(fields.cumulative_time, 10.0);
        assert_eq!(root.location().file, "/srv/app/pkg/mod/a.py");
    }

    #[test]
    fn test_path_depth_is_inherited() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0).with_path_depth(1);
        let child = root.child(&loc(3, "fast")).unwrap();
        assert_eq!(child.display_fields().filename, ".../a.py");
    }

    #[test]
    fn test_rebuilt_node_matches_first_build() {
        let graph = sample_graph();
        let root = TreeNode::roots(&graph).remove(0);
        let first = root.child(&loc(2, "slow")).unwrap();
        drop(first);
        let again = TreeNode::roots(&graph)
            .remove(0)
            .child(&loc(2, "slow"))
            .unwrap();
        assert_eq!(again.child_keys(), vec![&loc(6, "leaf")]);
        assert_eq!(again.display_fields().call_count, 1);
    }

    #[test]
    fn test_recursion_detected_on_path() {
        let mut data = ProfileData::new();
        data.insert(loc(1, "main"), RawStats::leaf(1, 0.0, 2.0));
        data.insert(
            loc(2, "fib"),
            RawStats::leaf(8, 2.0, 2.0)
                .with_caller(loc(1, "main"), EdgeStats::from_count(1))
                .with_caller(loc(2, "fib"), EdgeStats::from_count(7)),
        );
        let graph = build_call_graph(&data).unwrap();

        let root = TreeNode::roots(&graph).remove(0);
        let fib = root.child(&loc(2, "fib")).unwrap();
        let again = fib.child(&loc(2, "fib")).unwrap();

        assert!(!root.is_recursive());
        assert!(!fib.is_recursive());
        assert!(again.is_recursive());
        assert_eq!(again.stripe(), crate::tree::Stripe::Even);
    }
}
