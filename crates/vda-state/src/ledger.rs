use std::collections::BTreeMap;

use vda_schemas::ErrorEntry;

/// Fault records keyed by `errorType`; one entry per type, last write wins.
///
/// A fault reported on every cycle therefore occupies a single slot instead
/// of growing the published error list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorLedger {
    entries: BTreeMap<String, ErrorEntry>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, replacing any entry with the same `errorType`.
    pub fn append(&mut self, entry: ErrorEntry) {
        self.entries.insert(entry.error_type.clone(), entry);
    }

    /// Remove the entry of `error_type`. Returns `true` if one was present.
    pub fn clear_type(&mut self, error_type: &str) -> bool {
        self.entries.remove(error_type).is_some()
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, error_type: &str) -> Option<&ErrorEntry> {
        self.entries.get(error_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `errorType` order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.values()
    }

    pub fn to_vec(&self) -> Vec<ErrorEntry> {
        self.entries.values().cloned().collect()
    }
}
