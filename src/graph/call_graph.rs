//! The reconstructed call graph: every record plus the root set.

use super::record::{Record, RecordId};
use crate::parser::schema::Location;
use std::collections::HashMap;

/// Records owned collectively, addressed by `RecordId` or `Location`
#[derive(Debug, Clone)]
pub struct CallGraph {
    pub(crate) records: Vec<Record>,
    pub(crate) index: HashMap<Location, RecordId>,
    pub(crate) roots: Vec<RecordId>,
}

impl CallGraph {
    /// Entry points, by descending cumulative time then location
    pub fn roots(&self) -> &[RecordId] {
        &self.roots
    }

    pub fn record(&self, id: RecordId) -> &Record {
        &self.records[id.0]
    }

    pub fn get(&self, location: &Location) -> Option<&Record> {
        self.id_of(location).map(|id| self.record(id))
    }

    pub fn id_of(&self, location: &Location) -> Option<RecordId> {
        self.index.get(location).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of caller -> callee links
    pub fn edge_count(&self) -> usize {
        self.records.iter().map(Record::child_count).sum()
    }

    /// Sum of self time across all records
    pub fn total_self_time(&self) -> f64 {
        self.records.iter().map(|r| r.self_time).sum()
    }

    /// Locations not reachable from any root
    ///
    /// These records only live inside call cycles with no entry point in the
    /// captured data. They stay in the graph but no tree walk reaches them.
    pub fn detached(&self) -> Vec<&Location> {
        let mut seen = vec![false; self.records.len()];
        let mut stack: Vec<RecordId> = self.roots.clone();

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            stack.extend(self.record(id).children().filter(|child| !seen[child.0]));
        }

        self.records
            .iter()
            .zip(seen)
            .filter(|(_, reached)| !reached)
            .map(|(record, _)| &record.location)
            .collect()
    }
}
