//! Translation key paths and the automatic language key registry.
//!
//! A [`LanguagePath`] mirrors the position of the compiler in the field tree:
//! a segment is pushed on descent and popped on return. Pushes go through
//! [`LanguagePath::scoped`], whose guard pops on drop, so an error bubbling
//! out of a recursive call can never leave a stale segment behind.
//!
//! # Examples
//!
//! ```
//! use content_blocks_core::LanguagePath;
//!
//! let mut path = LanguagePath::new("LLL:EXT:acme/labels.xlf");
//! {
//!     let mut collection = path.scoped("items");
//!     let field = collection.scoped("title");
//!     assert_eq!(field.key_for("label"), "items.title.label");
//!     assert_eq!(field.path_for("label"), "LLL:EXT:acme/labels.xlf:items.title.label");
//! }
//! assert_eq!(path.depth(), 0);
//! ```

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Base translation file reference plus a stack of key segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePath {
    base: String,
    segments: Vec<String>,
}

impl LanguagePath {
    /// Creates a path rooted at a translation file reference.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            segments: Vec::new(),
        }
    }

    /// Translation file reference.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Number of pushed segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Pushes a segment; prefer [`scoped`](Self::scoped).
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Pops the innermost segment.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Pushes a segment that is popped when the returned guard drops.
    pub fn scoped(&mut self, segment: impl Into<String>) -> LanguageScope<'_> {
        self.push(segment);
        LanguageScope { path: self }
    }

    /// Current key relative to the translation file.
    pub fn current_key(&self) -> String {
        self.segments.join(".")
    }

    /// Current full reference.
    pub fn current(&self) -> String {
        if self.segments.is_empty() {
            self.base.clone()
        } else {
            format!("{}:{}", self.base, self.current_key())
        }
    }

    /// Relative key of `suffix` below the current position.
    pub fn key_for(&self, suffix: &str) -> String {
        if self.segments.is_empty() {
            suffix.to_string()
        } else {
            format!("{}.{suffix}", self.current_key())
        }
    }

    /// Full reference of `suffix` below the current position.
    pub fn path_for(&self, suffix: &str) -> String {
        format!("{}:{}", self.base, self.key_for(suffix))
    }
}

/// Guard returned by [`LanguagePath::scoped`].
#[derive(Debug)]
pub struct LanguageScope<'a> {
    path: &'a mut LanguagePath,
}

impl Deref for LanguageScope<'_> {
    type Target = LanguagePath;

    fn deref(&self) -> &LanguagePath {
        self.path
    }
}

impl DerefMut for LanguageScope<'_> {
    fn deref_mut(&mut self) -> &mut LanguagePath {
        self.path
    }
}

impl Drop for LanguageScope<'_> {
    fn drop(&mut self) {
        self.path.pop();
    }
}

/// One automatically collected translation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageKey {
    /// Key relative to the translation file (`headline.label`).
    pub key: String,
    /// Full reference (`LLL:EXT:...:headline.label`).
    pub path: String,
    /// Literal default text found in the document.
    pub default: String,
}

/// Append-only multimap from document name to collected translation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageKeyRegistry {
    keys: IndexMap<String, Vec<LanguageKey>>,
}

impl LanguageKeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key for a document.
    pub fn add(&mut self, document: &str, key: LanguageKey) {
        self.keys.entry(document.to_string()).or_default().push(key);
    }

    /// Keys collected for a document, in collection order.
    pub fn get(&self, document: &str) -> &[LanguageKey] {
        self.keys.get(document).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over documents and their keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LanguageKey])> {
        self.keys
            .iter()
            .map(|(document, keys)| (document.as_str(), keys.as_slice()))
    }

    /// Number of documents with at least one key.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key was collected.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key/default pairs per document for translation file scaffolding.
    ///
    /// Repeated keys keep the first default text.
    pub fn to_source_map(&self) -> IndexMap<String, IndexMap<String, String>> {
        self.keys
            .iter()
            .map(|(document, keys)| {
                let mut sources = IndexMap::new();
                for key in keys {
                    sources
                        .entry(key.key.clone())
                        .or_insert_with(|| key.default.clone());
                }
                (document.clone(), sources)
            })
            .collect()
    }
}
