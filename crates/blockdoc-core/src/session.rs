/*
 * session.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-document render state.
 */

//! Per-document render state.
//!
//! A [`Session`] is created for every call to
//! [`Compiler::render`](crate::Compiler::render) and dropped when the render
//! returns. Preprocessors and block handlers receive it by reference, so
//! nothing they record leaks from one document into the next.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::tree::ElementTree;

/// Typed per-document storage for extensions.
///
/// Holds at most one value per type.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the previous value of the same type.
    pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// Raw fragments set aside by preprocessors and restored by block handlers.
///
/// A stashed fragment is referenced from the line stream by a placeholder
/// line produced by [`Stash::placeholder`].
#[derive(Debug, Clone, Default)]
pub struct Stash {
    entries: Vec<StashEntry>,
}

/// A fenced code fragment removed from the line stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StashEntry {
    /// Info string after the opening fence (`rust`, `python`, ...)
    pub info: Option<String>,
    /// Body of the fence, without the fence lines
    pub code: String,
}

const PLACEHOLDER_PREFIX: &str = "\u{2}stash:";
const PLACEHOLDER_SUFFIX: &str = "\u{3}";

impl Stash {
    /// Store a fragment and return the placeholder line that stands in for it.
    pub fn store(&mut self, entry: StashEntry) -> String {
        let index = self.entries.len();
        self.entries.push(entry);
        Self::placeholder(index)
    }

    pub fn placeholder(index: usize) -> String {
        format!("{}{}{}", PLACEHOLDER_PREFIX, index, PLACEHOLDER_SUFFIX)
    }

    /// Parse a placeholder line back into a stash index.
    pub fn parse_placeholder(line: &str) -> Option<usize> {
        line.trim()
            .strip_prefix(PLACEHOLDER_PREFIX)?
            .strip_suffix(PLACEHOLDER_SUFFIX)?
            .parse()
            .ok()
    }

    pub fn get(&self, index: usize) -> Option<&StashEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State for one document render.
#[derive(Debug, Default)]
pub struct Session {
    /// The output tree being built
    pub tree: ElementTree,
    /// Fragments removed by preprocessors
    pub stash: Stash,
    /// Front-matter values removed by the `front_matter` preprocessor
    pub meta: IndexMap<String, String>,
    /// Extension-owned state
    pub extensions: Extensions,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(usize);

    #[test]
    fn test_extensions_roundtrip_by_type() {
        let mut ext = Extensions::new();
        assert!(ext.get::<Counter>().is_none());

        assert_eq!(ext.insert(Counter(1)), None);
        ext.get_mut::<Counter>().unwrap().0 += 1;
        assert_eq!(ext.get::<Counter>(), Some(&Counter(2)));

        assert_eq!(ext.insert(Counter(7)), Some(Counter(2)));
        assert_eq!(ext.remove::<Counter>(), Some(Counter(7)));
        assert!(ext.get::<Counter>().is_none());
    }

    #[test]
    fn test_stash_placeholder() {
        let mut stash = Stash::default();
        let line = stash.store(StashEntry {
            info: None,
            code: "x".to_string(),
        });
        assert_eq!(Stash::parse_placeholder(&line), Some(0));
        assert_eq!(Stash::parse_placeholder("plain text"), None);
        assert_eq!(stash.get(0).unwrap().code, "x");
    }
}
