//! Profile loading and input schema definitions.
//!
//! This module handles:
//! - The flat location -> stats mapping consumed by the graph builder
//! - JSON profile documents
//! - Binary pstats files written by cProfile
//! - Format detection

pub mod json;
pub mod marshal;
pub mod pstats;
pub mod schema;

use crate::utils::error::ParseError;
use log::{debug, info};
use std::path::Path;

// Re-export main types
pub use json::parse_json_profile;
pub use pstats::parse_pstats;
pub use schema::{EdgeStats, Location, ProfileData, RawStats};

/// Input format of a profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// Decide from the file extension and contents
    #[default]
    Auto,
    /// JSON document of `[location, stats]` pairs
    Json,
    /// Python marshal stats file (cProfile / pstats.dump_stats)
    Pstats,
}

/// Load a profile file from disk
///
/// **Public** - main entry point for parsing
///
/// # Errors
/// * `ParseError::Io` - file missing or unreadable
/// * Any format-specific parse error
pub fn load_profile(path: impl AsRef<Path>, format: InputFormat) -> Result<ProfileData, ParseError> {
    let path = path.as_ref();
    debug!("Reading profile from: {}", path.display());

    let bytes = std::fs::read(path)?;
    let format = match format {
        InputFormat::Auto => detect_format(path, &bytes),
        explicit => explicit,
    };

    info!("Parsing {} as {:?} ({} bytes)", path.display(), format, bytes.len());
    parse_profile(&bytes, format)
}

/// Parse profile bytes in a known format
pub fn parse_profile(bytes: &[u8], format: InputFormat) -> Result<ProfileData, ParseError> {
    match format {
        InputFormat::Json => parse_json_profile(bytes),
        InputFormat::Pstats => parse_pstats(bytes),
        InputFormat::Auto => parse_profile(bytes, sniff_format(bytes)),
    }
}

/// Pick a format from the extension, falling back to content sniffing
pub fn detect_format(path: &Path, bytes: &[u8]) -> InputFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
        _ => sniff_format(bytes),
    }
}

/// Marshal dicts also start with `{`, but are followed by a type code
/// rather than a JSON key or whitespace.
fn sniff_format(bytes: &[u8]) -> InputFormat {
    let mut text = bytes.iter().copied().skip_while(u8::is_ascii_whitespace);
    match text.next() {
        Some(b'[') => InputFormat::Json,
        Some(b'{') => match text.find(|b| !b.is_ascii_whitespace()) {
            Some(b'"') | Some(b'}') => InputFormat::Json,
            _ => InputFormat::Pstats,
        },
        _ => InputFormat::Pstats,
    }
}
