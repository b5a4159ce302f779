//! Run command implementation.
//!
//! The run command:
//! 1. Loads the profile file
//! 2. Reconstructs the call graph
//! 3. Creates one tree node per root
//! 4. Prints, exports and/or renders a flamegraph, or opens the browser

use crate::browser;
use crate::flamegraph::{build_collapsed_stacks, generate_flamegraph, FlamegraphConfig};
use crate::graph::build_call_graph;
use crate::output::{build_export, render_text_tree, write_export, write_svg};
use crate::parser::{load_profile, InputFormat};
use crate::tree::TreeNode;
use crate::utils::config::{DEFAULT_MAX_DEPTH, DEFAULT_PATH_DEPTH};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the run command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Profile file to load
    pub input: PathBuf,

    pub format: InputFormat,

    /// Trailing path segments kept in displayed filenames
    pub path_depth: usize,

    /// Print the tree as text to stdout
    pub print: bool,

    /// Depth bound for print, export and flamegraph
    pub max_depth: usize,

    /// Output path for the JSON tree export (optional)
    pub export: Option<PathBuf>,

    /// Output path for SVG flamegraph (optional)
    pub flamegraph: Option<PathBuf>,

    pub flamegraph_config: FlamegraphConfig,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            format: InputFormat::Auto,
            path_depth: DEFAULT_PATH_DEPTH,
            print: false,
            max_depth: DEFAULT_MAX_DEPTH,
            export: None,
            flamegraph: None,
            flamegraph_config: FlamegraphConfig::default(),
        }
    }
}

impl RunArgs {
    /// True when no batch output was requested
    pub fn is_interactive(&self) -> bool {
        !self.print && self.export.is_none() && self.flamegraph.is_none()
    }
}

/// Execute the run command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed profile files
/// * Profiles whose callers reference unknown functions, or with no root
/// * File write errors
/// * Terminal failures in the browser
pub fn execute_run(args: RunArgs) -> Result<()> {
    let start_time = Instant::now();
    let source = args.input.display().to_string();

    info!("Loading profile: {}", source);
    let data = load_profile(&args.input, args.format)
        .with_context(|| format!("Failed to load profile {}", source))?;

    let graph = build_call_graph(&data).context("Failed to build call graph")?;
    debug!(
        "Graph ready: {} functions, {} edges, {} roots, {:.3}s total self time",
        graph.len(),
        graph.edge_count(),
        graph.roots().len(),
        graph.total_self_time()
    );

    if args.is_interactive() {
        // The browser owns the terminal from here on; no logging until it exits.
        return browser::run(&graph, &source, args.path_depth).context("Browser failed");
    }

    let roots: Vec<TreeNode<'_>> = TreeNode::roots(&graph)
        .into_iter()
        .map(|node| node.with_path_depth(args.path_depth))
        .collect();

    if args.print {
        let text =
            render_text_tree(&roots, args.max_depth).context("Failed to render call tree")?;
        print!("{}", text);
    }

    if let Some(path) = &args.export {
        let export =
            build_export(&source, &roots, args.max_depth).context("Failed to build tree export")?;
        write_export(&export, path).context("Failed to write tree export")?;
        info!("✓ Tree export written to: {}", path.display());
    }

    if let Some(path) = &args.flamegraph {
        let stacks = build_collapsed_stacks(&roots, args.flamegraph_config.max_depth)
            .context("Failed to build collapsed stacks")?;
        let svg = generate_flamegraph(&stacks, Some(&args.flamegraph_config))
            .context("Failed to generate flamegraph")?;
        write_svg(&svg, path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", path.display());
    }

    info!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Validate run arguments
///
/// **Public** - can be called before execute_run for early validation
pub fn validate_args(args: &RunArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Profile path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Profile file not found: {}", args.input.display());
    }

    if args.path_depth == 0 {
        anyhow::bail!("path depth must be at least 1");
    }

    if args.max_depth == 0 {
        anyhow::bail!("max depth must be at least 1");
    }

    if args.flamegraph.is_some() && args.flamegraph_config.width == 0 {
        anyhow::bail!("flamegraph width must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn profile_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[[["a.py", 1, "main"], [1, 1, 0.1, 1.0]],
               [["a.py", 2, "work"], [1, 1, 0.9, 0.9, [[["a.py", 1, "main"], 1]]]]]"#
        )
        .unwrap();
        file
    }

    #[test]
    fn test_validate_args_rejects_zero_depths() {
        let file = profile_file();
        let mut args = RunArgs {
            input: file.path().to_path_buf(),
            ..RunArgs::default()
        };
        assert!(validate_args(&args).is_ok());

        args.path_depth = 0;
        assert!(validate_args(&args).is_err());

        args.path_depth = 1;
        args.max_depth = 0;
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_file() {
        let args = RunArgs {
            input: PathBuf::from("/definitely/not/here.prof"),
            ..RunArgs::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_is_interactive() {
        let mut args = RunArgs::default();
        assert!(args.is_interactive());
        args.print = true;
        assert!(!args.is_interactive());
    }

    #[test]
    fn test_execute_writes_outputs() {
        let file = profile_file();
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("out/tree.json");
        let svg = dir.path().join("out/flame.svg");

        execute_run(RunArgs {
            input: file.path().to_path_buf(),
            format: InputFormat::Json,
            export: Some(export.clone()),
            flamegraph: Some(svg.clone()),
            ..RunArgs::default()
        })
        .unwrap();

        let tree = std::fs::read_to_string(export).unwrap();
        assert!(tree.contains("\"function\": \"work\""));
        let svg = std::fs::read_to_string(svg).unwrap();
        assert!(svg.contains("<svg"));
    }
}
