//! Operator exclusion list (`.api.exclude`).
//!
//! One permission key per line. Blank lines and lines starting with `#` are
//! ignored. A descriptor is excluded when its own key, or one of its parent
//! keys, is listed.
use crate::normalize_key;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    Key,
    Parent,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::Key => "key",
            ExclusionReason::Parent => "parent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub reason: ExclusionReason,
    /// The listed key that triggered the exclusion.
    pub matched: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    keys: BTreeSet<String>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let keys = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| normalize_key(line).ok())
            .collect();
        Self { keys }
    }

    /// Read the list from `path`. A missing file is an empty list.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                tracing::debug!(
                    path = %path.display(),
                    entries = list.len(),
                    "loaded exclusion list"
                );
                Ok(list)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        normalize_key(key).is_ok_and(|key| self.keys.contains(&key))
    }

    /// Whether a descriptor with `key` and `parents` is excluded, and why.
    /// The key itself wins over its parents.
    pub fn check<S: AsRef<str>>(&self, key: &str, parents: &[S]) -> Option<Exclusion> {
        if self.contains(key) {
            return Some(Exclusion {
                reason: ExclusionReason::Key,
                matched: key.trim().to_lowercase(),
            });
        }
        parents
            .iter()
            .map(|parent| parent.as_ref())
            .find(|parent| self.contains(parent))
            .map(|parent| Exclusion {
                reason: ExclusionReason::Parent,
                matched: parent.trim().to_lowercase(),
            })
    }
}
