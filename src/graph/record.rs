//! Immutable per-function snapshot held by the call graph.

use crate::parser::schema::{EdgeStats, Location};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a record inside its `CallGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One profiled function plus its edges
///
/// Built once by `build_call_graph` and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Record {
    pub location: Location,
    pub call_count: u64,
    pub self_time: f64,
    pub cumulative_time: f64,

    /// Raw caller relation, verbatim from the input
    pub callers: Option<BTreeMap<Location, EdgeStats>>,

    pub(crate) children: BTreeSet<RecordId>,
    pub(crate) incoming_reference_count: usize,
}

impl Record {
    pub(crate) fn new(
        location: Location,
        call_count: u64,
        self_time: f64,
        cumulative_time: f64,
        callers: Option<BTreeMap<Location, EdgeStats>>,
    ) -> Self {
        Self {
            location,
            call_count,
            self_time,
            cumulative_time,
            callers,
            children: BTreeSet::new(),
            incoming_reference_count: 0,
        }
    }

    /// Callees of this function
    pub fn children(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.children.iter().copied()
    }

    pub fn has_child(&self, id: RecordId) -> bool {
        self.children.contains(&id)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of distinct callers that link to this record
    pub fn incoming_reference_count(&self) -> usize {
        self.incoming_reference_count
    }

    pub fn is_root(&self) -> bool {
        self.incoming_reference_count == 0
    }

    /// Edge statistics recorded for calls from `caller`
    pub fn edge_from(&self, caller: &Location) -> Option<&EdgeStats> {
        self.callers.as_ref().and_then(|callers| callers.get(caller))
    }
}
