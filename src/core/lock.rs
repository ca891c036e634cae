//! The lock record: an insertion-ordered set of resolved dependencies.
//!
//! Exactly one entry exists per canonical name. Insertion order is preserved
//! so that serializing the lock is deterministic: the order reflects the
//! depth-first walk that produced it.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::core::dependency::Dependency;
use crate::core::manifest::FORMAT_VERSION;

/// File name of the lock record next to the manifest.
pub const LOCK_FILE: &str = "stevedore.lock.json";

/// Ordered mapping from canonical name to resolved dependency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockSet {
    order: Vec<String>,
    entries: std::collections::HashMap<String, Dependency>,
}

impl LockSet {
    /// Create an empty lock set.
    pub fn new() -> Self {
        LockSet::default()
    }

    /// Look up an entry by canonical name.
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.entries.get(name)
    }

    /// Insert or update an entry, keyed by the dependency's canonical name.
    ///
    /// A fresh name is appended; updating an existing name keeps its
    /// original position.
    pub fn set(&mut self, dep: Dependency) {
        let name = dep.name();
        if self.entries.insert(name.clone(), dep).is_none() {
            self.order.push(name);
        }
    }

    /// Check whether a name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.order.iter().map(|name| &self.entries[name])
    }

    /// Iterate entries mutably, in no particular order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Dependency> {
        self.entries.values_mut()
    }
}

impl Serialize for LockSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for LockSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let deps = Vec::<Dependency>::deserialize(deserializer)?;
        let mut set = LockSet::new();
        for dep in deps {
            set.set(dep);
        }
        Ok(set)
    }
}

impl FromIterator<Dependency> for LockSet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut set = LockSet::new();
        for dep in iter {
            set.set(dep);
        }
        set
    }
}

/// On-disk schema of the lock record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockFile {
    /// Document format version
    pub version: u32,

    /// Resolved dependencies, in lock order
    #[serde(default)]
    pub dependencies: LockSet,
}

impl LockFile {
    /// Wrap a lock set in the current document format.
    pub fn new(dependencies: LockSet) -> Self {
        LockFile {
            version: FORMAT_VERSION,
            dependencies,
        }
    }

    /// Check whether this document format is understood.
    pub fn is_compatible(&self) -> bool {
        self.version == FORMAT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::{GitSource, LocalSource, Source};

    fn dep(remote: &str, version: &str) -> Dependency {
        Dependency::new(
            Source::Git(GitSource {
                remote: remote.to_string(),
                subdir: String::new(),
            }),
            version,
        )
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut set = LockSet::new();
        set.set(dep("https://example.com/b/b", "1"));
        set.set(dep("https://example.com/a/a", "1"));

        let names: Vec<String> = set.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["example.com/b/b", "example.com/a/a"]);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut set = LockSet::new();
        set.set(dep("https://example.com/b/b", "1"));
        set.set(dep("https://example.com/a/a", "1"));
        set.set(dep("https://example.com/b/b", "2"));

        let names: Vec<String> = set.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["example.com/b/b", "example.com/a/a"]);
        assert_eq!(set.get("example.com/b/b").unwrap().version, "2");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serialize_in_order() {
        let mut set = LockSet::new();
        set.set(dep("https://example.com/z/z", "1"));
        set.set(dep("https://example.com/a/a", "2"));

        let json = serde_json::to_string(&set).unwrap();
        let z = json.find("z/z").unwrap();
        let a = json.find("a/a").unwrap();
        assert!(z < a);
    }

    #[test]
    fn test_deserialize_roundtrip() {
        let mut set = LockSet::new();
        set.set(dep("https://example.com/z/z", "1"));
        set.set(
            Dependency::new(
                Source::Local(LocalSource {
                    directory: "lib/util".into(),
                }),
                "",
            ),
        );

        let json = serde_json::to_string(&LockFile::new(set.clone())).unwrap();
        let back: LockFile = serde_json::from_str(&json).unwrap();
        assert!(back.is_compatible());
        assert_eq!(back.dependencies, set);
    }
}
