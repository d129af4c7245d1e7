//! Accumulation of `key: value` response lines.

use crate::protocol::strip_trailing_newlines;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered key/value pairs collected from one command's response.
///
/// Arrival order and duplicate keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvBatch {
    entries: Vec<(String, String)>,
}

impl KvBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the pair carried by `line` if it has the form `key: value`.
    ///
    /// The first colon must be followed by a space; anything else is ignored.
    /// Returns whether a pair was appended.
    pub fn append_if_kv(&mut self, line: &str) -> bool {
        let Some(colon) = line.find(':') else {
            return false;
        };
        let Some(value) = line[colon + 1..].strip_prefix(' ') else {
            return false;
        };
        self.entries.push((
            line[..colon].to_string(),
            strip_trailing_newlines(value).to_string(),
        ));
        true
    }

    /// Empty the batch, keeping its allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the pairs in arrival order.
    pub fn materialize(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }

    /// Move the pairs out, leaving the batch empty.
    pub fn take(&mut self) -> KvBatch {
        let entries = self.entries.drain(..).collect();
        KvBatch { entries }
    }

    /// Value of the last pair with `key`, mirroring table assignment.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KvBatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// Serialized as a map in arrival order; duplicate keys are emitted as-is.
impl Serialize for KvBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
