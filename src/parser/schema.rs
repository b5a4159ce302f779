//! Input data model for flat, edge-only profiling data.
//!
//! A profile is a mapping from function location to its aggregate metrics.
//! The only structure it carries is the `callers` relation on each entry;
//! there is no explicit tree and no root pointer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique key of a profiled function: (file, line, function)
///
/// Deserializes from either `["a.py", 1, "f"]` or
/// `{"file": "a.py", "line": 1, "function": "f"}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.file, self.line, self.function)
    }
}

/// Statistics recorded along one caller -> callee edge
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeStats {
    /// Calls made along this edge
    pub call_count: u64,

    /// Non-recursive calls along this edge
    pub primitive_calls: u64,

    /// Callee self time attributed to this caller (seconds)
    pub self_time: f64,

    /// Callee cumulative time attributed to this caller (seconds)
    pub cumulative_time: f64,
}

impl EdgeStats {
    /// Edge known only by its call count (older pstats files)
    pub fn from_count(call_count: u64) -> Self {
        Self {
            call_count,
            primitive_calls: call_count,
            ..Default::default()
        }
    }
}

/// Metrics for one function as they appear in the input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawStats {
    pub call_count: u64,

    /// Seconds spent in the function itself
    pub self_time: f64,

    /// Seconds including callees
    pub cumulative_time: f64,

    /// Absent for entries recorded without caller data
    pub callers: Option<BTreeMap<Location, EdgeStats>>,
}

impl RawStats {
    pub fn leaf(call_count: u64, self_time: f64, cumulative_time: f64) -> Self {
        Self {
            call_count,
            self_time,
            cumulative_time,
            callers: None,
        }
    }

    pub fn with_caller(mut self, caller: Location, edge: EdgeStats) -> Self {
        self.callers
            .get_or_insert_with(BTreeMap::new)
            .insert(caller, edge);
        self
    }
}

/// The flat mapping handed to the graph builder
pub type ProfileData = BTreeMap<Location, RawStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = Location::new("a.py", 12, "main");
        assert_eq!(loc.to_string(), "a.py:12(main)");
    }

    #[test]
    fn test_location_ordering() {
        let a = Location::new("a.py", 2, "g");
        let b = Location::new("a.py", 10, "f");
        let c = Location::new("b.py", 1, "a");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_location_from_array() {
        let loc: Location = serde_json::from_str(r#"["a.py", 3, "h"]"#).unwrap();
        assert_eq!(loc, Location::new("a.py", 3, "h"));
    }

    #[test]
    fn test_with_caller_creates_mapping() {
        let stats = RawStats::leaf(1, 0.1, 0.2)
            .with_caller(Location::new("a.py", 1, "g"), EdgeStats::from_count(1));
        let callers = stats.callers.unwrap();
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[&Location::new("a.py", 1, "g")].call_count, 1);
    }
}
