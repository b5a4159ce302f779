//! Configuration and constants for the CLI.

/// Current export schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Number of trailing path segments kept when displaying a filename
pub const DEFAULT_PATH_DEPTH: usize = 3;

/// Marker placed in front of a truncated filename
pub const PATH_ELLIPSIS: &str = "...";

/// Depth bound for text, export and flamegraph walks
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default flamegraph width in pixels
pub const DEFAULT_FLAMEGRAPH_WIDTH: usize = 1200;

// A DAG with wide fan-out produces exponentially many root-to-leaf paths,
// so the flamegraph walk stops collecting after this many stacks.
pub const MAX_COLLAPSED_STACKS: usize = 100_000;

/// Node budget for the eager text and export walks, for the same reason
pub const MAX_TREE_NODES: usize = 100_000;

/// Flamegraph weights are integers, times are seconds
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Environment variable overriding the path truncation depth
pub const PATH_DEPTH_ENV: &str = "STEELIX_PATH_DEPTH";
