//! Steelix CLI
//!
//! Reconstructs the call tree of a flat function profile and opens it in an
//! interactive browser, or prints, exports and renders it as a flamegraph.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;

use steelix::commands::{execute_run, validate_args, RunArgs};
use steelix::flamegraph::FlamegraphConfig;
use steelix::parser::InputFormat;
use steelix::utils::config::{
    DEFAULT_FLAMEGRAPH_WIDTH, DEFAULT_MAX_DEPTH, DEFAULT_PATH_DEPTH, PATH_DEPTH_ENV,
};

/// Steelix - browse the call tree of a function profile
#[derive(Parser, Debug)]
#[command(name = "steelix")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Profile file (cProfile/pstats output or JSON)
    file: PathBuf,

    /// Input format
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,

    /// Trailing path segments shown for each filename
    #[arg(long, env = PATH_DEPTH_ENV, default_value_t = DEFAULT_PATH_DEPTH)]
    path_depth: usize,

    /// Print the call tree to stdout instead of opening the browser
    #[arg(long)]
    print: bool,

    /// Depth limit for --print, --export and --flamegraph
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Output path for a JSON export of the call tree
    #[arg(long)]
    export: Option<PathBuf>,

    /// Output path for an SVG flamegraph
    #[arg(long)]
    flamegraph: Option<PathBuf>,

    /// Flamegraph title
    #[arg(long)]
    title: Option<String>,

    /// Flamegraph width in pixels
    #[arg(long, default_value_t = DEFAULT_FLAMEGRAPH_WIDTH)]
    width: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let mut flamegraph_config = FlamegraphConfig::new()
        .with_width(cli.width)
        .with_max_depth(cli.max_depth);
    if let Some(title) = cli.title {
        flamegraph_config = flamegraph_config.with_title(title);
    } else if let Some(name) = cli.file.file_name() {
        flamegraph_config = flamegraph_config.with_title(name.to_string_lossy());
    }

    let args = RunArgs {
        input: cli.file,
        format: cli.format,
        path_depth: cli.path_depth,
        print: cli.print,
        max_depth: cli.max_depth,
        export: cli.export,
        flamegraph: cli.flamegraph,
        flamegraph_config,
    };

    // Validate args first
    validate_args(&args)?;

    execute_run(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_missing_file_is_usage_error() {
        assert!(Cli::try_parse_from(["steelix"]).is_err());
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "steelix",
            "--format",
            "pstats",
            "--print",
            "--max-depth",
            "5",
            "out.prof",
        ])
        .unwrap();
        assert_eq!(cli.format, InputFormat::Pstats);
        assert!(cli.print);
        assert_eq!(cli.max_depth, 5);
        assert_eq!(cli.file, PathBuf::from("out.prof"));
    }
}
