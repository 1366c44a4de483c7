//! Priority-ordered registry of named pipeline components.

/// A named, prioritized collection.
///
/// Iteration order is by descending priority; entries with equal priority
/// keep their registration order. Registering a name that already exists
/// replaces the old entry.
pub struct Registry<T> {
    entries: Vec<Entry<T>>,
}

struct Entry<T> {
    name: String,
    priority: i32,
    item: T,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, priority: i32, item: T) {
        let name = name.into();
        self.entries.retain(|e| e.name != name);
        // Insert after every entry with priority >= ours
        let at = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            Entry {
                name,
                priority,
                item,
            },
        );
    }

    pub fn deregister(&mut self, name: &str) -> Option<T> {
        let idx = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(idx).item)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
