//! Store path parsing.
//!
//! Paths are `/`-separated; empty segments (leading, trailing or doubled
//! slashes) are ignored and the empty path addresses the root.

use super::{StoreError, StoreResult};
use serde_json::{Map, Value};

const INFO_SEGMENT: &str = ".info";
const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

/// Splits `path` into validated segments.
pub fn parse_path(path: &str) -> StoreResult<Vec<String>> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    for (index, segment) in segments.iter().enumerate() {
        if index == 0 && segment == INFO_SEGMENT {
            continue;
        }
        if segment.contains(FORBIDDEN) || segment.chars().any(char::is_control) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments)
}

/// Parses a path that must be writable (anything outside `.info`).
pub fn parse_writable_path(path: &str) -> StoreResult<Vec<String>> {
    let segments = parse_path(path)?;
    if is_info(&segments) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

pub fn is_info(segments: &[String]) -> bool {
    segments.first().is_some_and(|head| head == INFO_SEGMENT)
}

/// Joins a base path and a relative child path.
pub fn join(base: &str, child: &str) -> String {
    let base = base.trim_matches('/');
    let child = child.trim_matches('/');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{child}"),
    }
}

/// Whether one path is a prefix of the other (they address overlapping data).
pub fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(left, right)| left == right)
}

/// Resolves the keys of a multi-path update under `base` into absolute
/// segments, in key order.
///
/// # Errors
/// - `InvalidPath` when a key is malformed, addresses the root or `.info`,
///   or when two keys address overlapping data.
pub fn parse_update_paths(
    base: &str,
    changes: &Map<String, Value>,
) -> StoreResult<Vec<Vec<String>>> {
    let base_segments = parse_writable_path(base)?;
    let mut paths = Vec::with_capacity(changes.len());
    for key in changes.keys() {
        let mut segments = base_segments.clone();
        segments.extend(parse_path(key)?);
        if segments.is_empty() || is_info(&segments) {
            return Err(StoreError::InvalidPath(key.clone()));
        }
        paths.push(segments);
    }
    for (index, left) in paths.iter().enumerate() {
        if paths[index + 1..].iter().any(|right| overlaps(left, right)) {
            return Err(StoreError::InvalidPath(format!(
                "overlapping update paths under `{base}`"
            )));
        }
    }
    Ok(paths)
}
