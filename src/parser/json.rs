//! JSON profile parser.
//!
//! Accepts a bare array of `[location, value]` pairs or an object wrapping
//! that array under `"functions"`. Values mirror the pstats tuples:
//! `[cc, nc, tt, ct]` or `[cc, nc, tt, ct, [[caller, edge], ...]]`.

use super::schema::{EdgeStats, Location, ProfileData, RawStats};
use crate::utils::error::ParseError;
use log::debug;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Wrapped { functions: Vec<JsonEntry> },
    Bare(Vec<JsonEntry>),
}

type JsonEntry = (Location, JsonValue);

/// The second call count is a quirk of the pstats layout; it is read and dropped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonValue {
    Linked(u64, IgnoredAny, f64, f64, Vec<(Location, JsonEdge)>),
    Leaf(u64, IgnoredAny, f64, f64),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonEdge {
    Full(u64, u64, f64, f64),
    Count(u64),
}

impl From<JsonEdge> for EdgeStats {
    fn from(edge: JsonEdge) -> Self {
        match edge {
            JsonEdge::Full(call_count, primitive_calls, self_time, cumulative_time) => EdgeStats {
                call_count,
                primitive_calls,
                self_time,
                cumulative_time,
            },
            JsonEdge::Count(count) => EdgeStats::from_count(count),
        }
    }
}

impl From<JsonValue> for RawStats {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Leaf(call_count, _, self_time, cumulative_time) => {
                RawStats::leaf(call_count, self_time, cumulative_time)
            }
            JsonValue::Linked(call_count, _, self_time, cumulative_time, callers) => RawStats {
                call_count,
                self_time,
                cumulative_time,
                callers: Some(
                    callers
                        .into_iter()
                        .map(|(loc, edge)| (loc, edge.into()))
                        .collect::<BTreeMap<_, _>>(),
                ),
            },
        }
    }
}

/// Parse a JSON profile document
///
/// # Errors
/// * `ParseError::JsonError` - document does not match the expected shape
/// * `ParseError::DuplicateLocation` - the same location appears twice
pub fn parse_json_profile(input: &[u8]) -> Result<ProfileData, ParseError> {
    let document: JsonDocument = serde_json::from_slice(input)?;
    let entries = match document {
        JsonDocument::Wrapped { functions } => functions,
        JsonDocument::Bare(entries) => entries,
    };

    debug!("Parsed {} JSON profile entries", entries.len());

    let mut data = ProfileData::new();
    for (location, value) in entries {
        if data.contains_key(&location) {
            return Err(ParseError::DuplicateLocation(location));
        }
        data.insert(location, value.into());
    }

    Ok(data)
}
