//! A single register: an ordered, duplicate-free list of paths

use super::paths::paths_equal;

/// Entry terminator in the shared area; paths containing it cannot be stored
pub const ENTRY_SENTINEL: char = crate::layout::ENTRY_SENTINEL as char;

/// Ordered list of paths stored under one register name.
///
/// Entries may be tombstoned by pruning passes; tombstones are skipped by all
/// readers and removed by [`Register::pack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    name: char,
    entries: Vec<Option<String>>,
}

impl Register {
    /// Create an empty register
    pub fn new(name: char) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Name of the register
    pub fn name(&self) -> char {
        self.name
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Whether the register holds no live entries
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Live entries in insertion order
    pub fn files(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|entry| entry.as_deref())
    }

    /// Live entries as owned strings
    pub fn to_vec(&self) -> Vec<String> {
        self.files().map(str::to_string).collect()
    }

    /// Whether `path` is already stored
    pub fn contains(&self, path: &str) -> bool {
        self.files().any(|file| paths_equal(file, path))
    }

    /// Serialized size in the shared area: each entry plus its sentinel byte
    pub fn serialized_size(&self) -> usize {
        self.files().map(|file| file.len() + 1).sum()
    }

    pub(crate) fn push(&mut self, path: String) {
        self.entries.push(Some(path));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn replace(&mut self, entries: Vec<String>) {
        self.entries = entries.into_iter().map(Some).collect();
    }

    /// Tombstone the entry at `index` (tombstones included in indexing)
    pub(crate) fn tombstone(&mut self, index: usize) -> Option<String> {
        self.entries.get_mut(index).and_then(Option::take)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Option<String>] {
        &mut self.entries
    }

    /// Drop tombstones, keeping the relative order of live entries
    pub(crate) fn pack(&mut self) {
        self.entries.retain(Option::is_some);
    }
}
