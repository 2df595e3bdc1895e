use std::collections::HashMap;
use std::fmt::Display;

use crate::model::{Customer, Labelled, User};

/// Resolve a foreign key to a display label by scanning `candidates`.
///
/// Identifiers compare by their string form, so `3` and `"3"` match. When
/// nothing matches the raw identifier is returned.
pub fn resolve_label<K, C>(target: &K, candidates: &[C]) -> String
where
    K: Display + ?Sized,
    C: Labelled,
{
    let key = target.to_string();
    candidates
        .iter()
        .find(|candidate| candidate.key() == key)
        .map(Labelled::label)
        .unwrap_or(key)
}

/// A customer shown through its user (`username (email)`), falling back to
/// the raw user id.
pub fn customer_label(customer: &Customer, users: &[User]) -> String {
    resolve_label(&customer.user_id, users)
}

/// Precomputed id → label map for one loaded list, for O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: HashMap<String, String>,
}

impl LabelIndex {
    /// First occurrence wins, matching [`resolve_label`].
    pub fn build<C: Labelled>(candidates: &[C]) -> Self {
        let mut labels = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            labels
                .entry(candidate.key())
                .or_insert_with(|| candidate.label());
        }
        Self { labels }
    }

    pub fn resolve<K: Display + ?Sized>(&self, target: &K) -> String {
        let key = target.to_string();
        match self.labels.get(&key) {
            Some(label) => label.clone(),
            None => key,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
