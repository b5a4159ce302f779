//! Build a call graph from flat, edge-only profiling data.
//!
//! The input only records, for each function, which functions called it.
//! Building inverts that relation into parent -> children links and then
//! derives the entry points by reference counting.
//!
//! Example: `{f: callers {g}, g: no callers}` becomes `g -> f` with root `g`.

use super::call_graph::CallGraph;
use super::record::{Record, RecordId};
use crate::parser::schema::ProfileData;
use crate::utils::error::GraphError;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Build the call graph and its root set
///
/// **Public** - main entry point for graph reconstruction
///
/// # Algorithm
/// 1. Materialize one `Record` per input entry
/// 2. Link every record under each of its callers, counting incoming links
/// 3. Roots are exactly the records with no incoming links
///
/// # Errors
/// * `GraphError::MalformedInput` - a caller has no entry of its own
/// * `GraphError::NoRoot` - no record is free of incoming links
pub fn build_call_graph(data: &ProfileData) -> Result<CallGraph, GraphError> {
    debug!("Building call graph from {} entries", data.len());

    // All records must exist before linking, since linking resolves caller
    // locations to records.
    let mut records = Vec::with_capacity(data.len());
    let mut index = HashMap::with_capacity(data.len());
    for (location, stats) in data {
        index.insert(location.clone(), RecordId(records.len()));
        records.push(Record::new(
            location.clone(),
            stats.call_count,
            stats.self_time,
            stats.cumulative_time,
            stats.callers.clone(),
        ));
    }

    let mut links = Vec::new();
    for (child_index, record) in records.iter().enumerate() {
        let Some(callers) = &record.callers else {
            continue;
        };
        for caller in callers.keys() {
            let parent = index
                .get(caller)
                .copied()
                .ok_or_else(|| GraphError::MalformedInput {
                    caller: caller.clone(),
                    callee: record.location.clone(),
                })?;
            links.push((parent, RecordId(child_index)));
        }
    }

    for (parent, child) in &links {
        records[parent.0].children.insert(*child);
        records[child.0].incoming_reference_count += 1;
    }

    debug!("Linked {} caller edges", links.len());

    let roots = select_roots(&records);
    if roots.is_empty() {
        return Err(GraphError::NoRoot {
            records: records.len(),
        });
    }

    let graph = CallGraph {
        records,
        index,
        roots,
    };

    let detached = graph.detached();
    if !detached.is_empty() {
        warn!(
            "{} functions are only reachable through call cycles and will not appear in the tree",
            detached.len()
        );
    }

    info!(
        "Call graph: {} functions, {} edges, {} roots",
        graph.len(),
        graph.edge_count(),
        graph.roots().len()
    );

    Ok(graph)
}

/// Every record with no incoming link, heaviest first
///
/// No single "best" root is guessed: disjoint call chains each get their own
/// entry point, and an empty result is reported rather than papered over.
fn select_roots(records: &[Record]) -> Vec<RecordId> {
    let mut roots: Vec<RecordId> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.is_root())
        .map(|(index, _)| RecordId(index))
        .collect();

    roots.sort_by(|a, b| by_cumulative_time(&records[a.0], &records[b.0]));
    roots
}

/// Descending cumulative time, ties broken by ascending location
pub(crate) fn by_cumulative_time(a: &Record, b: &Record) -> Ordering {
    b.cumulative_time
        .total_cmp(&a.cumulative_time)
        .then_with(|| a.location.cmp(&b.location))
}
