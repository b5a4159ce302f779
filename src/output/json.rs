//! JSON call-tree export.
//!
//! Walks the lazy tree eagerly (within a depth bound and a node budget) and
//! writes the result as a nested document.

use super::prepare_output_path;
use crate::tree::TreeCursor;
use crate::utils::config::{MAX_TREE_NODES, SCHEMA_VERSION};
use crate::utils::error::{OutputError, TreeError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level export document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeExport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Profile the tree was built from
    pub source: String,

    /// Timestamp when the export was generated
    pub generated_at: String,

    /// The node budget ran out before the whole tree was written
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    pub roots: Vec<ExportNode>,
}

/// One exported tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub file: String,
    pub line: u32,
    pub function: String,
    pub call_count: u64,
    pub self_time: f64,
    pub cumulative_time: f64,

    /// Location already on the path above; not expanded
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,

    /// Some children were left out by the depth bound or node budget
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExportNode>,
}

/// Build the export document from tree roots
///
/// **Public** - used by the `--export` mode
///
/// At most `MAX_TREE_NODES` nodes are exported. Nodes whose children were
/// skipped, by the depth bound or the node budget, are flagged `truncated`,
/// and so is the document itself when the budget ran out.
pub fn build_export<'g, C: TreeCursor<'g>>(
    source: &str,
    roots: &[C],
    max_depth: usize,
) -> Result<TreeExport, TreeError> {
    build_limited(source, roots, max_depth, MAX_TREE_NODES)
}

fn build_limited<'g, C: TreeCursor<'g>>(
    source: &str,
    roots: &[C],
    max_depth: usize,
    max_nodes: usize,
) -> Result<TreeExport, TreeError> {
    use chrono::Utc;

    let mut walker = ExportWalker {
        max_depth,
        remaining: max_nodes,
        capped: false,
    };
    let mut exported = Vec::with_capacity(roots.len());
    for root in roots {
        match walker.visit(root)? {
            Some(node) => exported.push(node),
            None => break,
        }
    }

    if walker.capped {
        warn!(
            "Stopped exporting the call tree after {} nodes; use --max-depth to narrow it",
            max_nodes
        );
    }

    Ok(TreeExport {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        truncated: walker.capped,
        roots: exported,
    })
}

struct ExportWalker {
    max_depth: usize,
    remaining: usize,
    capped: bool,
}

impl ExportWalker {
    /// `None` once the node budget is spent
    fn visit<'g, C: TreeCursor<'g>>(&mut self, node: &C) -> Result<Option<ExportNode>, TreeError> {
        if self.remaining == 0 {
            self.capped = true;
            return Ok(None);
        }
        self.remaining -= 1;

        let location = node.location();
        let fields = node.display_fields();
        let mut exported = ExportNode {
            file: location.file.clone(),
            line: location.line,
            function: location.function.clone(),
            call_count: fields.call_count,
            self_time: fields.self_time,
            cumulative_time: fields.cumulative_time,
            cycle: false,
            truncated: false,
            children: Vec::new(),
        };

        if node.is_recursive() {
            exported.cycle = true;
            return Ok(Some(exported));
        }

        let keys = node.child_keys();
        if keys.is_empty() {
            return Ok(Some(exported));
        }
        if node.depth() + 1 >= self.max_depth || self.remaining == 0 {
            exported.truncated = true;
            self.capped |= self.remaining == 0;
            return Ok(Some(exported));
        }

        for key in keys {
            match self.visit(&node.child(key)?)? {
                Some(child) => exported.children.push(child),
                None => {
                    exported.truncated = true;
                    break;
                }
            }
        }
        Ok(Some(exported))
    }
}

/// Write an export document to a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_export(export: &TreeExport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing call tree to: {}", output_path.display());
    prepare_output_path(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, export).map_err(OutputError::SerializationFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!("Call tree written ({} roots)", export.roots.len());
    Ok(())
}

/// Read an export document back
pub fn read_export(input_path: impl AsRef<Path>) -> Result<TreeExport, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading call tree from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::ReadFailed)?;
    let export = serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;
    Ok(export)
}
