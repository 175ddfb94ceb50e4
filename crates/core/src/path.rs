//! Allocation-free path comparison over absolute path strings
//!
//! Paths are walked as `(string, offset)` views so that descending through
//! the hierarchy never slices out owned substrings. Both `/` and the native
//! separator count as segment breaks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::sync::Arc;

/// How path segments are compared
///
/// Fixed when a hierarchy is created; every comparison inside one hierarchy
/// uses the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    CaseSensitive,
    CaseInsensitive,
}

impl CaseSensitivity {
    /// Sensitivity of the file system this process usually runs on
    pub fn platform() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::CaseInsensitive
        } else {
            Self::CaseSensitive
        }
    }

    pub fn is_case_sensitive(self) -> bool {
        self == Self::CaseSensitive
    }
}

pub fn is_file_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

fn fold(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_lowercase()
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

/// Compare two characters, treating all separators as equal and lower than
/// any other character.
pub fn compare_chars(c1: char, c2: char, case_sensitivity: CaseSensitivity) -> Ordering {
    match (is_file_separator(c1), is_file_separator(c2)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => match case_sensitivity {
            CaseSensitivity::CaseSensitive => c1.cmp(&c2),
            CaseSensitivity::CaseInsensitive => fold(c1).cmp(&fold(c2)),
        },
    }
}

fn chars_equal(c1: char, c2: char, case_sensitivity: CaseSensitivity) -> bool {
    compare_chars(c1, c2, case_sensitivity) == Ordering::Equal
}

/// Lexicographic path comparison with separators as break characters
pub fn compare_paths(path1: &str, path2: &str, case_sensitivity: CaseSensitivity) -> Ordering {
    let mut left = path1.chars();
    let mut right = path2.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => match compare_chars(a, b, case_sensitivity) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Order used for the children of a directory snapshot
///
/// Case-insensitive first with a case-sensitive tiebreak, so the order is
/// identical on every platform and usable for lookups in both modes.
pub fn compare_file_names(name1: &str, name2: &str) -> Ordering {
    compare_paths(name1, name2, CaseSensitivity::CaseInsensitive)
        .then_with(|| compare_paths(name1, name2, CaseSensitivity::CaseSensitive))
}

/// Compare only the first segment of `key` against the first segment of `path`
pub fn compare_first_segments(
    key: &str,
    path: &str,
    case_sensitivity: CaseSensitivity,
) -> Ordering {
    let mut left = key.chars().take_while(|c| !is_file_separator(*c));
    let mut right = path.chars().take_while(|c| !is_file_separator(*c));
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => match compare_chars(a, b, case_sensitivity) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Match `prefix` against the start of `path`, returning the number of bytes
/// of `path` consumed when every character of `prefix` matched.
fn match_prefix(prefix: &str, path: &str, case_sensitivity: CaseSensitivity) -> Option<usize> {
    let mut path_chars = path.char_indices();
    for p in prefix.chars() {
        match path_chars.next() {
            Some((_, c)) if chars_equal(p, c, case_sensitivity) => {}
            _ => return None,
        }
    }
    Some(path_chars.next().map_or(path.len(), |(i, _)| i))
}

/// Whether `path` equals `prefix` or lies below it
pub fn is_child_of_or_this(prefix: &str, path: &str, case_sensitivity: CaseSensitivity) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match match_prefix(prefix, path, case_sensitivity) {
        Some(consumed) => at_segment_end(path, consumed),
        None => false,
    }
}

fn at_segment_end(path: &str, index: usize) -> bool {
    index == path.len() || path[index..].starts_with(is_file_separator)
}

/// Byte lengths of the longest common prefix of `key` and `path` that ends on
/// a segment boundary in both; `(0, 0)` when not even the first segment matches.
pub fn common_prefix_lengths(
    key: &str,
    path: &str,
    case_sensitivity: CaseSensitivity,
) -> (usize, usize) {
    let mut key_chars = key.char_indices();
    let mut path_chars = path.char_indices();
    let mut last_boundary = (0, 0);
    loop {
        match (key_chars.next(), path_chars.next()) {
            (None, None) => return (key.len(), path.len()),
            (None, Some((j, c))) => {
                return if is_file_separator(c) {
                    (key.len(), j)
                } else {
                    last_boundary
                };
            }
            (Some((i, c)), None) => {
                return if is_file_separator(c) {
                    (i, path.len())
                } else {
                    last_boundary
                };
            }
            (Some((i, a)), Some((j, b))) => {
                if !chars_equal(a, b, case_sensitivity) {
                    return last_boundary;
                }
                if is_file_separator(a) {
                    last_boundary = (i, j);
                }
            }
        }
    }
}

/// Length of the common prefix, measured in `key`
pub fn common_prefix_length(key: &str, path: &str, case_sensitivity: CaseSensitivity) -> usize {
    common_prefix_lengths(key, path, case_sensitivity).0
}

/// Last segment of a path
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_file_separator);
    match trimmed.rfind(is_file_separator) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// How a query path relates to a child map key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRelationship {
    /// The path is the key
    Exact,
    /// The path lies below the key; the rest of the path starts at `path_offset`
    Descendant { path_offset: usize },
    /// The key lies below the path; the rest of the key starts at `key_offset`
    Ancestor { key_offset: usize },
    /// Key and path share leading segments but diverge afterwards
    Sibling {
        key_prefix_len: usize,
        path_prefix_len: usize,
    },
    /// Not even the first segment is shared
    Unrelated,
}

/// Classify `path` against `key`
pub fn classify(key: &str, path: &str, case_sensitivity: CaseSensitivity) -> PathRelationship {
    if let Some(consumed) = match_prefix(key, path, case_sensitivity) {
        if consumed == path.len() {
            return PathRelationship::Exact;
        }
        if at_segment_end(path, consumed) {
            return PathRelationship::Descendant {
                path_offset: consumed + 1,
            };
        }
    }
    if let Some(consumed) = match_prefix(path, key, case_sensitivity) {
        if consumed < key.len() && at_segment_end(key, consumed) {
            return PathRelationship::Ancestor {
                key_offset: consumed + 1,
            };
        }
    }
    match common_prefix_lengths(key, path, case_sensitivity) {
        (0, _) | (_, 0) => PathRelationship::Unrelated,
        (key_prefix_len, path_prefix_len) => PathRelationship::Sibling {
            key_prefix_len,
            path_prefix_len,
        },
    }
}

/// A suffix view into an absolute path
///
/// The offset always sits at the start of a segment; the absolute path never
/// ends with a separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePath<'a> {
    absolute_path: &'a str,
    offset: usize,
}

impl<'a> RelativePath<'a> {
    /// View an absolute path relative to the file system root
    ///
    /// Trailing separators are dropped and one leading separator is skipped,
    /// so `/` maps to the empty path.
    ///
    /// # Panics
    ///
    /// If a second separator follows the leading one.
    pub fn of(absolute_path: &'a str) -> Self {
        let trimmed = absolute_path.trim_end_matches(is_file_separator);
        let offset = if trimmed.starts_with(is_file_separator) { 1 } else { 0 };
        assert!(
            !trimmed[offset..].starts_with(is_file_separator),
            "malformed path '{absolute_path}': empty leading segment"
        );
        Self {
            absolute_path: trimmed,
            offset,
        }
    }

    pub fn absolute_path(&self) -> &'a str {
        self.absolute_path
    }

    pub fn as_str(&self) -> &'a str {
        &self.absolute_path[self.offset..]
    }

    pub fn len(&self) -> usize {
        self.absolute_path.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Skip `start` bytes of the relative path
    pub fn suffix_starting_from(&self, start: usize) -> Self {
        Self {
            absolute_path: self.absolute_path,
            offset: (self.offset + start).min(self.absolute_path.len()),
        }
    }

    /// The path relative to a child whose key is a prefix of this path
    pub fn from_child(&self, child_key: &str) -> Self {
        if child_key.len() >= self.len() {
            self.suffix_starting_from(self.len())
        } else {
            self.suffix_starting_from(child_key.len() + 1)
        }
    }

    /// First segment of the relative path
    pub fn first_segment(&self) -> &'a str {
        let rest = self.as_str();
        match rest.find(is_file_separator) {
            Some(index) => &rest[..index],
            None => rest,
        }
    }

    pub fn is_child_of_or_this(&self, prefix: &str, case_sensitivity: CaseSensitivity) -> bool {
        is_child_of_or_this(prefix, self.as_str(), case_sensitivity)
    }

    pub fn length_of_common_prefix(&self, key: &str, case_sensitivity: CaseSensitivity) -> usize {
        common_prefix_length(key, self.as_str(), case_sensitivity)
    }

    pub fn compare_to_first_segment(
        &self,
        key: &str,
        case_sensitivity: CaseSensitivity,
    ) -> Ordering {
        compare_first_segments(key, self.as_str(), case_sensitivity)
    }

    pub fn classify(&self, key: &str, case_sensitivity: CaseSensitivity) -> PathRelationship {
        classify(key, self.as_str(), case_sensitivity)
    }
}

/// Tracks the relative segments of a depth-first walk
#[derive(Debug, Default, Clone)]
pub struct RelativePathTracker {
    segments: SmallVec<[Arc<str>; 16]>,
    root_entered: bool,
}

impl RelativePathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a location; the first call enters the walk root itself
    pub fn enter(&mut self, name: Arc<str>) {
        if self.root_entered {
            self.segments.push(name);
        } else {
            self.root_entered = true;
        }
    }

    pub fn leave(&mut self) {
        if self.segments.pop().is_none() {
            self.root_entered = false;
        }
    }

    /// Whether the current location is the walk root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments from the walk root (exclusive) to the current location
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CaseSensitivity::{CaseInsensitive, CaseSensitive};

    #[test]
    fn test_relative_path_of_strips_root_and_trailing() {
        let path = RelativePath::of("/a/b/");
        assert_eq!(path.as_str(), "a/b");
        assert_eq!(path.absolute_path(), "/a/b");

        assert!(RelativePath::of("/").is_empty());
        assert_eq!(RelativePath::of("/a").first_segment(), "a");
    }

    #[test]
    #[should_panic(expected = "malformed path")]
    fn test_double_leading_separator_is_rejected() {
        RelativePath::of("//a");
    }

    #[test]
    fn test_from_child() {
        let path = RelativePath::of("/a/b/c");
        assert_eq!(path.from_child("a").as_str(), "b/c");
        assert_eq!(path.from_child("a/b").as_str(), "c");
        assert!(path.from_child("a/b/c").is_empty());
    }

    #[test]
    fn test_is_child_of_or_this() {
        assert!(is_child_of_or_this("", "a/b", CaseSensitive));
        assert!(is_child_of_or_this("a", "a/b", CaseSensitive));
        assert!(is_child_of_or_this("a/b", "a/b", CaseSensitive));
        assert!(!is_child_of_or_this("a", "ab", CaseSensitive));
        assert!(!is_child_of_or_this("a/b/c", "a/b", CaseSensitive));
        assert!(!is_child_of_or_this("A", "a/b", CaseSensitive));
        assert!(is_child_of_or_this("A", "a/b", CaseInsensitive));
    }

    #[test]
    fn test_common_prefix_never_splits_a_segment() {
        assert_eq!(common_prefix_length("a/b/x", "a/b/y", CaseSensitive), 3);
        assert_eq!(common_prefix_length("abc", "abd", CaseSensitive), 0);
        assert_eq!(common_prefix_length("a/bc", "a/bd", CaseSensitive), 1);
        assert_eq!(common_prefix_length("a/b", "a/b/c", CaseSensitive), 3);
        assert_eq!(common_prefix_length("a/b/c", "a/b", CaseSensitive), 3);
        assert_eq!(common_prefix_length("A/b/x", "a/B/y", CaseInsensitive), 3);
        assert_eq!(common_prefix_length("A/b/x", "a/B/y", CaseSensitive), 0);
    }

    #[test]
    fn test_separators_sort_first() {
        assert_eq!(compare_paths("a/b", "a.b", CaseSensitive), Ordering::Less);
        assert_eq!(compare_paths("a", "a/b", CaseSensitive), Ordering::Less);
        assert_eq!(compare_paths("a/b", "a/b", CaseSensitive), Ordering::Equal);
    }

    #[test]
    fn test_compare_first_segments() {
        assert_eq!(compare_first_segments("a/x", "a/y", CaseSensitive), Ordering::Equal);
        assert_eq!(compare_first_segments("a", "ab", CaseSensitive), Ordering::Less);
        assert_eq!(compare_first_segments("b", "a/c", CaseSensitive), Ordering::Greater);
        assert_eq!(compare_first_segments("A", "a", CaseInsensitive), Ordering::Equal);
        assert_ne!(compare_first_segments("A", "a", CaseSensitive), Ordering::Equal);
    }

    #[test]
    fn test_compare_file_names_is_stable_across_case() {
        let mut names = vec!["b", "B", "a", "A", "c"];
        names.sort_by(|a, b| compare_file_names(a, b));
        assert_eq!(names, vec!["A", "a", "B", "b", "c"]);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("a/b", "a/b", CaseSensitive), PathRelationship::Exact);
        assert_eq!(
            classify("a", "a/b/c", CaseSensitive),
            PathRelationship::Descendant { path_offset: 2 }
        );
        assert_eq!(
            classify("a/b/c", "a", CaseSensitive),
            PathRelationship::Ancestor { key_offset: 2 }
        );
        assert_eq!(
            classify("a/b/x", "a/b/y", CaseSensitive),
            PathRelationship::Sibling {
                key_prefix_len: 3,
                path_prefix_len: 3
            }
        );
        assert_eq!(classify("a", "b", CaseSensitive), PathRelationship::Unrelated);
        assert_eq!(classify("ab", "a", CaseSensitive), PathRelationship::Unrelated);
        assert_eq!(classify("A/B", "a/b", CaseInsensitive), PathRelationship::Exact);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/a/b/c"), "c");
        assert_eq!(file_name("/a/b/"), "b");
        assert_eq!(file_name("c"), "c");
        assert_eq!(file_name("/"), "");
    }

    #[test]
    fn test_path_tracker() {
        let mut tracker = RelativePathTracker::new();
        tracker.enter(Arc::from("root"));
        assert!(tracker.is_root());
        tracker.enter(Arc::from("sub"));
        tracker.enter(Arc::from("f"));
        assert_eq!(tracker.segments().len(), 2);
        tracker.leave();
        tracker.leave();
        assert!(tracker.is_root());
    }
}
