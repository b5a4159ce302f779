//! Conversion of a decoded pstats dictionary into `ProfileData`.
//!
//! Layout written by `pstats.Stats.dump_stats`:
//! `{(file, line, func): (cc, nc, tt, ct, {(file, line, func): (nc, cc, tt, ct)})}`

use super::marshal::{self, Value};
use super::schema::{EdgeStats, Location, ProfileData, RawStats};
use crate::utils::error::ParseError;
use log::debug;
use std::collections::BTreeMap;

/// Parse a marshal-encoded pstats file
///
/// # Errors
/// * Any marshal decoding error
/// * `ParseError::InvalidFormat` - the decoded value is not a stats dictionary
pub fn parse_pstats(input: &[u8]) -> Result<ProfileData, ParseError> {
    let value = marshal::decode(input)?;
    let Value::Dict(entries) = value else {
        return Err(shape_error("top-level stats", "dict", &value));
    };

    debug!("Decoded pstats dictionary with {} entries", entries.len());

    let mut data = ProfileData::new();
    for (key, value) in &entries {
        let location = to_location(key)?;
        let stats = to_raw_stats(&location, value)?;
        if data.insert(location.clone(), stats).is_some() {
            return Err(ParseError::DuplicateLocation(location));
        }
    }

    Ok(data)
}

fn to_location(value: &Value) -> Result<Location, ParseError> {
    match value {
        Value::Tuple(items) if items.len() == 3 => {
            let file = as_str(&items[0], "location file")?;
            let line = as_u64(&items[1], "location line")?;
            let line = u32::try_from(line).map_err(|_| {
                ParseError::InvalidFormat(format!("line number {line} out of range"))
            })?;
            let function = as_str(&items[2], "location function")?;
            Ok(Location::new(file, line, function))
        }
        other => Err(shape_error("location", "3-tuple", other)),
    }
}

fn to_raw_stats(location: &Location, value: &Value) -> Result<RawStats, ParseError> {
    let Value::Tuple(items) = value else {
        return Err(shape_error("stats value", "tuple", value));
    };
    if items.len() != 4 && items.len() != 5 {
        return Err(ParseError::InvalidFormat(format!(
            "stats for {location} have {} fields, expected 4 or 5",
            items.len()
        )));
    }

    let mut stats = RawStats::leaf(
        as_u64(&items[0], "call count")?,
        as_f64(&items[2], "self time")?,
        as_f64(&items[3], "cumulative time")?,
    );

    if let Some(callers) = items.get(4) {
        let Value::Dict(pairs) = callers else {
            return Err(shape_error("callers", "dict", callers));
        };
        let mut map = BTreeMap::new();
        for (caller, edge) in pairs {
            map.insert(to_location(caller)?, to_edge(edge)?);
        }
        stats.callers = Some(map);
    }

    Ok(stats)
}

fn to_edge(value: &Value) -> Result<EdgeStats, ParseError> {
    match value {
        Value::Tuple(items) if items.len() == 4 => Ok(EdgeStats {
            call_count: as_u64(&items[0], "edge call count")?,
            primitive_calls: as_u64(&items[1], "edge primitive calls")?,
            self_time: as_f64(&items[2], "edge self time")?,
            cumulative_time: as_f64(&items[3], "edge cumulative time")?,
        }),
        Value::Int(_) => Ok(EdgeStats::from_count(as_u64(value, "edge call count")?)),
        other => Err(shape_error("caller edge", "4-tuple or int", other)),
    }
}

fn as_str(value: &Value, what: &str) -> Result<String, ParseError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(shape_error(what, "str", other)),
    }
}

fn as_u64(value: &Value, what: &str) -> Result<u64, ParseError> {
    match value {
        Value::Int(n) => u64::try_from(*n)
            .map_err(|_| ParseError::InvalidFormat(format!("{what} is negative: {n}"))),
        other => Err(shape_error(what, "int", other)),
    }
}

fn as_f64(value: &Value, what: &str) -> Result<f64, ParseError> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Int(n) => Ok(*n as f64),
        other => Err(shape_error(what, "number", other)),
    }
}

fn shape_error(what: &str, expected: &str, found: &Value) -> ParseError {
    ParseError::InvalidFormat(format!("{what}: expected {expected}, found {}", found.kind()))
}
