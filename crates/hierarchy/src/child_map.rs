//! Sorted child maps with size-tiered representations
//!
//! Keys are relative paths that may span several segments. No two keys of
//! one map share their first segment, so a query path matches at most one
//! entry. Entries are ordered by their first segment under the hierarchy's
//! case sensitivity.

use std::cmp::Ordering;
use std::sync::Arc;
use vfs_core::path::{compare_first_segments, CaseSensitivity, PathRelationship, RelativePath};

/// Maps with at least this many entries are searched by bisection
pub const BINARY_SEARCH_THRESHOLD: usize = 10;

/// One keyed child
#[derive(Debug, Clone)]
pub struct Entry<T> {
    key: Arc<str>,
    value: T,
}

impl<T> Entry<T> {
    pub fn new(key: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &Arc<str> {
        &self.key
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

/// A child matched by [`ChildMap::find_child`]
#[derive(Debug)]
pub struct FoundChild<'a, T> {
    pub index: usize,
    pub key: &'a Arc<str>,
    pub value: &'a T,
    pub relationship: PathRelationship,
}

/// Persistent ordered map from path keys to children
///
/// Every edit returns a new map; the receiver is never changed.
#[derive(Debug, Clone)]
pub enum ChildMap<T> {
    Empty,
    Singleton(Entry<T>),
    Multi(Vec<Entry<T>>),
}

impl<T> Default for ChildMap<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T: Clone> ChildMap<T> {
    pub fn new() -> Self {
        Self::Empty
    }

    pub fn singleton(key: impl Into<Arc<str>>, value: T) -> Self {
        Self::Singleton(Entry::new(key, value))
    }

    /// Build a map from entries in any order
    ///
    /// # Panics
    ///
    /// If two entries share their first segment.
    pub fn from_entries(mut entries: Vec<Entry<T>>, case_sensitivity: CaseSensitivity) -> Self {
        entries.sort_by(|a, b| compare_first_segments(&a.key, &b.key, case_sensitivity));
        assert!(
            entries.windows(2).all(|pair| {
                compare_first_segments(&pair[0].key, &pair[1].key, case_sensitivity)
                    != Ordering::Equal
            }),
            "child keys must not share a first segment"
        );
        Self::from_sorted(entries)
    }

    fn from_sorted(mut entries: Vec<Entry<T>>) -> Self {
        match entries.len() {
            0 => Self::Empty,
            1 => match entries.pop() {
                Some(entry) => Self::Singleton(entry),
                None => Self::Empty,
            },
            _ => Self::Multi(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn entries(&self) -> &[Entry<T>] {
        match self {
            Self::Empty => &[],
            Self::Singleton(entry) => std::slice::from_ref(entry),
            Self::Multi(entries) => entries,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &T)> {
        self.entries().iter().map(|entry| (&entry.key, &entry.value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries().iter().map(|entry| &entry.value)
    }

    /// Locate the entry sharing the first segment of `path` and classify
    /// `path` against its key
    pub fn find_child(
        &self,
        path: &RelativePath<'_>,
        case_sensitivity: CaseSensitivity,
    ) -> Option<FoundChild<'_, T>> {
        let entries = self.entries();
        let index = if entries.len() < BINARY_SEARCH_THRESHOLD {
            entries.iter().position(|entry| {
                path.compare_to_first_segment(&entry.key, case_sensitivity) == Ordering::Equal
            })?
        } else {
            entries
                .binary_search_by(|entry| {
                    path.compare_to_first_segment(&entry.key, case_sensitivity)
                })
                .ok()?
        };

        let entry = &entries[index];
        match path.classify(&entry.key, case_sensitivity) {
            PathRelationship::Unrelated => None,
            relationship => Some(FoundChild {
                index,
                key: &entry.key,
                value: &entry.value,
                relationship,
            }),
        }
    }

    /// Add an entry whose first segment is not present yet
    ///
    /// # Panics
    ///
    /// If an entry with the same first segment exists.
    pub fn insert_child(
        &self,
        key: impl Into<Arc<str>>,
        value: T,
        case_sensitivity: CaseSensitivity,
    ) -> Self {
        let key = key.into();
        let entries = self.entries();
        let position = match entries
            .binary_search_by(|entry| compare_first_segments(&entry.key, &key, case_sensitivity))
        {
            Ok(_) => panic!("child '{key}' shares its first segment with an existing child"),
            Err(position) => position,
        };

        let mut new_entries = Vec::with_capacity(entries.len() + 1);
        new_entries.extend_from_slice(&entries[..position]);
        new_entries.push(Entry { key, value });
        new_entries.extend_from_slice(&entries[position..]);
        Self::from_sorted(new_entries)
    }

    /// Swap the entry at `index`; the new key must keep the first segment
    pub fn replace_child(&self, index: usize, key: impl Into<Arc<str>>, value: T) -> Self {
        let mut new_entries = self.entries().to_vec();
        new_entries[index] = Entry::new(key, value);
        Self::from_sorted(new_entries)
    }

    pub fn remove_child(&self, index: usize) -> Self {
        let mut new_entries = self.entries().to_vec();
        new_entries.remove(index);
        Self::from_sorted(new_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use CaseSensitivity::{CaseInsensitive, CaseSensitive};

    fn map_of(keys: &[&str], case_sensitivity: CaseSensitivity) -> ChildMap<usize> {
        let entries = keys
            .iter()
            .enumerate()
            .map(|(i, key)| Entry::new(*key, i))
            .collect();
        ChildMap::from_entries(entries, case_sensitivity)
    }

    fn keys(map: &ChildMap<usize>) -> Vec<String> {
        map.iter().map(|(key, _)| key.to_string()).collect()
    }

    #[test]
    fn test_representation_follows_size() {
        let empty: ChildMap<usize> = ChildMap::new();
        assert!(empty.is_empty());

        let one = empty.insert_child("a", 1, CaseSensitive);
        assert!(matches!(one, ChildMap::Singleton(_)));

        let two = one.insert_child("b", 2, CaseSensitive);
        assert!(matches!(two, ChildMap::Multi(_)));

        let back = two.remove_child(0);
        assert!(matches!(back, ChildMap::Singleton(_)));
        assert!(back.remove_child(0).is_empty());

        // persistent: earlier versions are untouched
        assert_eq!(two.len(), 2);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_insert_keeps_order() {
        let map = map_of(&["c", "a"], CaseSensitive).insert_child("b/x", 9, CaseSensitive);
        assert_eq!(keys(&map), vec!["a", "b/x", "c"]);
    }

    #[test]
    fn test_find_child_classifies() {
        let map = map_of(&["a/b", "c"], CaseSensitive);

        let found = map.find_child(&RelativePath::of("/a/b"), CaseSensitive).unwrap();
        assert_eq!(found.relationship, PathRelationship::Exact);

        let found = map.find_child(&RelativePath::of("/a/b/c"), CaseSensitive).unwrap();
        assert_eq!(found.relationship, PathRelationship::Descendant { path_offset: 4 });

        let found = map.find_child(&RelativePath::of("/a"), CaseSensitive).unwrap();
        assert_eq!(found.relationship, PathRelationship::Ancestor { key_offset: 2 });

        let found = map.find_child(&RelativePath::of("/a/x"), CaseSensitive).unwrap();
        assert!(matches!(found.relationship, PathRelationship::Sibling { .. }));

        assert!(map.find_child(&RelativePath::of("/d"), CaseSensitive).is_none());
        assert!(map.find_child(&RelativePath::of("/ab"), CaseSensitive).is_none());
    }

    #[test]
    fn test_find_child_case_insensitive() {
        let map = map_of(&["Src", "docs"], CaseInsensitive);
        let found = map.find_child(&RelativePath::of("/src/main"), CaseInsensitive).unwrap();
        assert_eq!(found.key.as_ref(), "Src");

        let map = map_of(&["Src", "docs"], CaseSensitive);
        assert!(map.find_child(&RelativePath::of("/src/main"), CaseSensitive).is_none());
    }

    #[test]
    fn test_linear_and_binary_search_agree() {
        let mut names: Vec<String> = (0..40).map(|i| format!("dir{i:02}")).collect();
        names.shuffle(&mut ChaCha8Rng::seed_from_u64(11));

        for size in [3, BINARY_SEARCH_THRESHOLD - 1, BINARY_SEARCH_THRESHOLD, 40] {
            let keys: Vec<&str> = names[..size].iter().map(String::as_str).collect();
            let map = map_of(&keys, CaseSensitive);
            for (value, name) in keys.iter().enumerate() {
                let query = format!("/{name}/file");
                let found = map.find_child(&RelativePath::of(&query), CaseSensitive).unwrap();
                assert_eq!(*found.value, value);
            }
            assert!(map.find_child(&RelativePath::of("/zzz"), CaseSensitive).is_none());
        }
    }

    #[test]
    #[should_panic(expected = "first segment")]
    fn test_duplicate_first_segment_panics() {
        map_of(&["a/b", "a/c"], CaseSensitive);
    }
}
