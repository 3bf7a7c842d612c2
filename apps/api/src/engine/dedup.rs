use std::collections::HashSet;

/// Insertion-ordered string set that deduplicates case-insensitively.
///
/// The first spelling inserted wins: once "Python" is in, "python" and
/// " PYTHON " are treated as the same entry. Surrounding whitespace is
/// trimmed; empty strings are ignored.
#[derive(Debug, Default, Clone)]
pub struct FoldedSet {
    items: Vec<String>,
    keys: HashSet<String>,
}

impl FoldedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the value was new.
    pub fn insert(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if self.keys.insert(fold(value)) {
            self.items.push(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn extend<'a, I: IntoIterator<Item = &'a str>>(&mut self, values: I) {
        for v in values {
            self.insert(v);
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.keys.contains(&fold(value.trim()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Case-fold key used for every skill comparison in the engine.
pub fn fold(value: &str) -> String {
    value.to_lowercase()
}
