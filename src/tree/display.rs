//! Read-only row projection of a record for renderers.

use crate::graph::Record;
use crate::utils::config::PATH_ELLIPSIS;
use serde::Serialize;

/// What a renderer shows for one tree row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFields {
    /// Possibly truncated; never use it for lookups
    pub filename: String,
    pub line: u32,
    pub function: String,
    pub call_count: u64,
    pub self_time: f64,
    pub cumulative_time: f64,
}

impl DisplayFields {
    pub fn from_record(record: &Record, path_depth: usize) -> Self {
        Self {
            filename: truncate_path(&record.location.file, path_depth),
            line: record.location.line,
            function: record.location.function.clone(),
            call_count: record.call_count,
            self_time: record.self_time,
            cumulative_time: record.cumulative_time,
        }
    }

    /// `file:line(function)`, the pstats spelling
    pub fn label(&self) -> String {
        format!("{}:{}({})", self.filename, self.line, self.function)
    }
}

/// Keep the last `depth` path segments, marking anything dropped
///
/// `"/a/b/c/d/e.py"` at depth 3 becomes `".../c/d/e.py"`; `"/a/b.py"` is
/// returned unchanged. Windows paths split on `\` as well and keep their
/// own separator.
pub fn truncate_path(path: &str, depth: usize) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    if depth == 0 || segments.len() <= depth {
        return path.to_string();
    }
    let separator = if path.contains('/') { "/" } else { "\\" };
    format!(
        "{}{}{}",
        PATH_ELLIPSIS,
        separator,
        segments[segments.len() - depth..].join(separator)
    )
}

/// Row shading, a pure function of depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stripe {
    Even,
    Odd,
}

impl Stripe {
    pub fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Stripe::Even
        } else {
            Stripe::Odd
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_deep_path() {
        assert_eq!(truncate_path("/a/b/c/d/e.py", 3), ".../c/d/e.py");
    }

    #[test]
    fn test_shallow_path_unchanged() {
        assert_eq!(truncate_path("/a/b.py", 3), "/a/b.py");
        assert_eq!(truncate_path("c/d/e.py", 3), "c/d/e.py");
        assert_eq!(truncate_path("~", 3), "~");
    }

    #[test]
    fn test_truncate_relative_path() {
        assert_eq!(truncate_path("pkg/sub/mod/x.py", 2), ".../mod/x.py");
    }

    #[test]
    fn test_truncate_windows_path() {
        assert_eq!(
            truncate_path("C:\\proj\\pkg\\mod\\a.py", 3),
            "...\\pkg\\mod\\a.py"
        );
        assert_eq!(truncate_path("C:\\a.py", 3), "C:\\a.py");
    }

    #[test]
    fn test_zero_depth_disables_truncation() {
        assert_eq!(truncate_path("/a/b/c/d/e.py", 0), "/a/b/c/d/e.py");
    }

    #[test]
    fn test_stripe_alternates() {
        assert_eq!(Stripe::for_depth(0), Stripe::Even);
        assert_eq!(Stripe::for_depth(1), Stripe::Odd);
        assert_eq!(Stripe::for_depth(4), Stripe::Even);
    }
}
