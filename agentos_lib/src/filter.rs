//! Draft versus applied filters.

use std::collections::BTreeMap;

use crate::record::Record;

/// Filter values being edited (`draft`) and the ones the list was fetched
/// with (`applied`). Editing the draft never touches the applied set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    defaults: BTreeMap<String, String>,
    draft: BTreeMap<String, String>,
    applied: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new(defaults: BTreeMap<String, String>) -> Self {
        Self {
            draft: defaults.clone(),
            applied: defaults.clone(),
            defaults,
        }
    }

    /// Sets a draft value. An empty value clears the key.
    pub fn set_draft(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.draft.remove(key);
        } else {
            self.draft.insert(key.to_string(), value.to_string());
        }
    }

    pub fn clear_draft(&mut self, key: &str) {
        self.draft.remove(key);
    }

    pub fn draft(&self) -> &BTreeMap<String, String> {
        &self.draft
    }

    pub fn applied(&self) -> &BTreeMap<String, String> {
        &self.applied
    }

    /// True when the draft differs from what is applied.
    pub fn is_dirty(&self) -> bool {
        self.draft != self.applied
    }

    /// Commits the draft. Returns the newly applied filters.
    pub fn apply(&mut self) -> &BTreeMap<String, String> {
        self.applied = self.draft.clone();
        &self.applied
    }

    /// Restores defaults on both draft and applied filters.
    pub fn reset(&mut self) {
        self.draft = self.defaults.clone();
        self.applied = self.defaults.clone();
    }
}

/// Keeps the records matching every filter.
pub fn filter_locally<R: Record>(rows: Vec<R>, filters: &BTreeMap<String, String>) -> Vec<R> {
    rows.into_iter()
        .filter(|row| filters.iter().all(|(key, value)| row.matches(key, value)))
        .collect()
}
