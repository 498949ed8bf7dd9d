//! Bidirectional category vocabulary.

use std::collections::{BTreeSet, HashMap};

/// Dense mapping between category strings and ids `0..len`
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocab {
    items: Vec<String>,
    o2i: HashMap<String, usize>,
}

impl CategoryVocab {
    /// Build from an explicit ordering; later duplicates are dropped.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            items: Vec::new(),
            o2i: HashMap::new(),
        };
        for item in items {
            let item = item.into();
            if !vocab.o2i.contains_key(&item) {
                vocab.o2i.insert(item.clone(), vocab.items.len());
                vocab.items.push(item);
            }
        }
        vocab
    }

    /// Collect the unique labels of a dataset, sorted.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self::new(unique)
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the vocab has no categories
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Id for a label
    pub fn id(&self, label: &str) -> Option<i64> {
        self.o2i.get(label).map(|&i| i as i64)
    }

    /// Label for an id
    pub fn label(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// Categories in id order
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_order_and_dedups() {
        let vocab = CategoryVocab::new(["O", "PER", "ORG", "PER"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("PER"), Some(1));
        assert_eq!(vocab.label(2), Some("ORG"));
    }

    #[test]
    fn test_from_labels_sorts() {
        let vocab = CategoryVocab::from_labels(["O", "PER", "O", "B-LOC"]);
        assert_eq!(vocab.items(), &["B-LOC", "O", "PER"]);
    }

    #[test]
    fn test_out_of_range_ids() {
        let vocab = CategoryVocab::new(["O"]);
        assert_eq!(vocab.label(-100), None);
        assert_eq!(vocab.label(1), None);
        assert_eq!(vocab.id("X"), None);
    }
}
