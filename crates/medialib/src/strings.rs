use std::collections::HashMap;
use std::sync::Arc;

/// Deduplicated metadata strings shared by every collection of a generation.
///
/// The pool is carried from one generation to the next. Strings that no
/// track referenced during the last pass become orphans; they stay interned
/// until the next pass starts or [`StringPool::purge_orphans`] releases them.
#[derive(Clone, Debug, Default)]
pub struct StringPool {
    strings: HashMap<Arc<str>, bool>,
    orphans: Vec<Arc<str>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> Arc<str> {
        if let Some(existing) = self.get(text) {
            self.strings.insert(Arc::clone(&existing), true);
            return existing;
        }
        let value: Arc<str> = Arc::from(text);
        self.strings.insert(Arc::clone(&value), true);
        value
    }

    pub fn get(&self, text: &str) -> Option<Arc<str>> {
        self.strings.get_key_value(text).map(|(key, _)| Arc::clone(key))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn orphans(&self) -> &[Arc<str>] {
        &self.orphans
    }

    /// Releases the orphans of the previous pass and marks every remaining
    /// string unused. An orphan therefore outlives its last reference by one
    /// generation only.
    pub(crate) fn begin_pass(&mut self) {
        self.purge_orphans();
        for used in self.strings.values_mut() {
            *used = false;
        }
    }

    /// Collects the strings nobody interned during the pass.
    pub(crate) fn end_pass(&mut self, keep_orphans: bool) {
        let mut orphans: Vec<Arc<str>> = self
            .strings
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(text, _)| Arc::clone(text))
            .collect();
        orphans.sort();
        if keep_orphans {
            self.orphans = orphans;
        } else {
            for text in &orphans {
                self.strings.remove(text);
            }
        }
    }

    /// Releases every orphan, returning how many strings were dropped.
    pub fn purge_orphans(&mut self) -> usize {
        let orphans = std::mem::take(&mut self.orphans);
        for text in &orphans {
            self.strings.remove(text);
        }
        orphans.len()
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.orphans.clear();
    }
}
