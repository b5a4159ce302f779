//! Browser state: the flattened list of visible rows and the selection.
//!
//! Rows are created when their parent is expanded and dropped again when it
//! is collapsed, so only the visible part of the tree ever exists.

use crate::tree::{TreeCursor, TreeNode};
use crate::utils::error::TreeError;
use ratatui::widgets::ListState;

/// One visible line of the tree
#[derive(Debug, Clone)]
pub struct Row<'g> {
    pub node: TreeNode<'g>,
    pub expanded: bool,
    /// Location already on the path above; shown as a terminal leaf
    pub cycle: bool,
    pub has_children: bool,
}

impl<'g> Row<'g> {
    fn new(node: TreeNode<'g>) -> Self {
        let cycle = node.is_recursive();
        let has_children = node.record().child_count() > 0;
        Self {
            node,
            expanded: false,
            cycle,
            has_children,
        }
    }

    pub fn is_expandable(&self) -> bool {
        self.has_children && !self.cycle
    }
}

pub struct Browser<'g> {
    rows: Vec<Row<'g>>,
    selected: usize,
    list_state: ListState,
}

impl<'g> Browser<'g> {
    pub fn new(roots: Vec<TreeNode<'g>>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            rows: roots.into_iter().map(Row::new).collect(),
            selected: 0,
            list_state,
        }
    }

    pub fn rows(&self) -> &[Row<'g>] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&Row<'g>> {
        self.rows.get(self.selected)
    }

    pub(crate) fn list_state_mut(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
        self.list_state.select(Some(self.selected));
    }

    pub fn move_down(&mut self) {
        self.select(self.selected.saturating_add(1));
    }

    pub fn move_up(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }

    pub fn page_down(&mut self, page: usize) {
        self.select(self.selected.saturating_add(page.max(1)));
    }

    pub fn page_up(&mut self, page: usize) {
        self.select(self.selected.saturating_sub(page.max(1)));
    }

    pub fn home(&mut self) {
        self.select(0);
    }

    pub fn end(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    /// Insert the selected row's children below it
    pub fn expand(&mut self) -> Result<(), TreeError> {
        let Some(row) = self.rows.get(self.selected) else {
            return Ok(());
        };
        if row.expanded || !row.is_expandable() {
            return Ok(());
        }

        let children = row.node.children()?;
        let at = self.selected + 1;
        self.rows.splice(at..at, children.into_iter().map(Row::new));
        self.rows[self.selected].expanded = true;
        Ok(())
    }

    /// Drop every row below the selected one that belongs to its subtree
    pub fn collapse(&mut self) {
        let Some(row) = self.rows.get(self.selected) else {
            return;
        };
        if !row.expanded {
            return;
        }

        let depth = row.node.depth();
        let start = self.selected + 1;
        let end = self.rows[start..]
            .iter()
            .position(|r| r.node.depth() <= depth)
            .map_or(self.rows.len(), |offset| start + offset);
        self.rows.drain(start..end);
        self.rows[self.selected].expanded = false;
    }

    pub fn toggle(&mut self) -> Result<(), TreeError> {
        match self.selected_row().map(|row| row.expanded) {
            Some(true) => {
                self.collapse();
                Ok(())
            }
            Some(false) => self.expand(),
            None => Ok(()),
        }
    }

    /// Collapse an open row, or move to the parent of a closed one
    pub fn collapse_or_parent(&mut self) {
        let Some(row) = self.rows.get(self.selected) else {
            return;
        };
        if row.expanded {
            self.collapse();
            return;
        }
        if row.node.parent().is_none() {
            return;
        }

        // The parent is the nearest row above that is one level shallower.
        let depth = row.node.depth();
        if let Some(index) = self.rows[..self.selected]
            .iter()
            .rposition(|r| r.node.depth() + 1 == depth)
        {
            self.select(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_call_graph, CallGraph};
    use crate::parser::schema::{EdgeStats, Location, ProfileData, RawStats};

    fn loc(line: u32, func: &str) -> Location {
        Location::new("a.py", line, func)
    }

    // main -> {parse, run}, run -> {step, run}, other (second root)
    fn sample_graph() -> CallGraph {
        let edge = EdgeStats::from_count(1);
        let mut data = ProfileData::new();
        data.insert(loc(1, "main"), RawStats::leaf(1, 0.0, 3.0));
        data.insert(loc(9, "other"), RawStats::leaf(1, 0.2, 0.2));
        data.insert(
            loc(2, "parse"),
            RawStats::leaf(1, 0.5, 0.5).with_caller(loc(1, "main"), edge),
        );
        data.insert(
            loc(3, "run"),
            RawStats::leaf(2, 1.0, 2.5)
                .with_caller(loc(1, "main"), edge)
                .with_caller(loc(3, "run"), edge),
        );
        data.insert(
            loc(4, "step"),
            RawStats::leaf(5, 1.5, 1.5).with_caller(loc(3, "run"), edge),
        );
        build_call_graph(&data).unwrap()
    }

    fn names(browser: &Browser<'_>) -> Vec<String> {
        browser
            .rows()
            .iter()
            .map(|r| format!("{}{}", "-".repeat(r.node.depth()), r.node.location().function))
            .collect()
    }

    #[test]
    fn test_starts_with_roots_only() {
        let graph = sample_graph();
        let browser = Browser::new(TreeNode::roots(&graph));
        assert_eq!(names(&browser), vec!["main", "other"]);
        assert_eq!(browser.selected(), 0);
    }

    #[test]
    fn test_expand_inserts_children_in_order() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));

        browser.expand().unwrap();
        assert_eq!(names(&browser), vec!["main", "-run", "-parse", "other"]);

        browser.move_down();
        browser.expand().unwrap();
        assert_eq!(
            names(&browser),
            vec!["main", "-run", "--run", "--step", "-parse", "other"]
        );
        assert!(browser.rows()[2].cycle);
        assert!(!browser.rows()[2].is_expandable());
    }

    #[test]
    fn test_cycle_row_does_not_expand() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        browser.expand().unwrap();
        browser.move_down();
        browser.expand().unwrap();
        browser.move_down();

        browser.expand().unwrap();
        assert_eq!(browser.rows().len(), 6);
    }

    #[test]
    fn test_collapse_removes_whole_subtree() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        browser.expand().unwrap();
        browser.move_down();
        browser.expand().unwrap();

        browser.home();
        browser.collapse();
        assert_eq!(names(&browser), vec!["main", "other"]);
        assert!(!browser.rows()[0].expanded);
    }

    #[test]
    fn test_toggle_round_trip() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        browser.toggle().unwrap();
        assert_eq!(browser.rows().len(), 4);
        browser.toggle().unwrap();
        assert_eq!(browser.rows().len(), 2);
    }

    #[test]
    fn test_collapse_or_parent_jumps_up() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        browser.expand().unwrap();
        browser.move_down();
        browser.expand().unwrap();
        browser.page_down(2);
        assert_eq!(browser.selected_row().unwrap().node.location().function, "step");

        browser.collapse_or_parent();
        assert_eq!(browser.selected(), 1);

        browser.collapse_or_parent();
        assert_eq!(names(&browser), vec!["main", "-run", "-parse", "other"]);
    }

    #[test]
    fn test_selection_clamped() {
        let graph = sample_graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        browser.page_down(50);
        assert_eq!(browser.selected(), 1);
        browser.move_down();
        assert_eq!(browser.selected(), 1);
        browser.page_up(50);
        assert_eq!(browser.selected(), 0);
    }
}
