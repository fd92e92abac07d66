//! Field type catalog.
//!
//! Maps author-facing type names (`Text`, `Collection`, `Palette`, ...) to a
//! [`TypeDescriptor`] describing how the compiler treats the type: its
//! structural [`FieldKind`], the [`TcaKind`] it serializes to, and a few
//! capability flags. The catalog is a plain lookup table; hosts may register
//! additional types before handing it to the compiler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structural role of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// A plain column.
    Ordinary,
    /// Groups sibling fields for display.
    Palette,
    /// Groups siblings into a form section.
    Tab,
    /// Breaks a palette row.
    Linebreak,
    /// A list of child records in a child table.
    Collection,
    /// A self-contained nested form structure.
    FlexForm,
}

/// Storage/form kind a field type serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcaKind {
    Input,
    Text,
    Number,
    Email,
    Link,
    Password,
    Color,
    Datetime,
    Check,
    Radio,
    Select,
    Category,
    Group,
    Folder,
    File,
    Inline,
    Flex,
    Language,
    Uuid,
    Json,
    Slug,
    Country,
    /// Stores a value without any form rendering or labels.
    Passthrough,
    /// Structural markers (palettes, tabs, line breaks).
    None,
}

/// How item labels of a type are keyed in the translation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemLabels {
    /// The type has no enumerable items.
    None,
    /// Items are keyed by their value.
    ByValue,
    /// Items are keyed by position (checkbox-like types without values).
    ByIndex,
}

/// Capability descriptor of one field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Author-facing type name.
    pub name: String,
    pub kind: FieldKind,
    pub tca: TcaKind,
    /// Whether values take part in backend search.
    pub searchable: bool,
    /// Whether the type renders as a standalone form widget (allowed in
    /// FlexForm containers).
    pub renderable: bool,
    /// Whether values reference other records.
    pub relational: bool,
    pub items: ItemLabels,
}

impl TypeDescriptor {
    /// Creates an ordinary, renderable, non-searchable descriptor.
    pub fn new(name: &str, tca: TcaKind) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Ordinary,
            tca,
            searchable: false,
            renderable: true,
            relational: false,
            items: ItemLabels::None,
        }
    }

    /// Creates a structural marker descriptor.
    pub fn structural(name: &str, kind: FieldKind) -> Self {
        Self {
            kind,
            renderable: false,
            ..Self::new(name, TcaKind::None)
        }
    }

    fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    fn relational(mut self) -> Self {
        self.relational = true;
        self
    }

    fn not_renderable(mut self) -> Self {
        self.renderable = false;
        self
    }

    fn with_items(mut self, items: ItemLabels) -> Self {
        self.items = items;
        self
    }

    fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Registry of field types by name.
///
/// # Examples
///
/// ```
/// use content_blocks_core::{FieldKind, FieldTypeCatalog, TcaKind};
///
/// let catalog = FieldTypeCatalog::standard();
/// let collection = catalog.get("Collection").unwrap();
/// assert_eq!(collection.kind, FieldKind::Collection);
/// assert_eq!(collection.tca, TcaKind::Inline);
/// assert!(catalog.get("Unknown").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldTypeCatalog {
    types: BTreeMap<String, TypeDescriptor>,
}

impl FieldTypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the catalog of built-in field types.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        let builtin = [
            TypeDescriptor::new("Text", TcaKind::Input).searchable(),
            TypeDescriptor::new("Textarea", TcaKind::Text).searchable(),
            TypeDescriptor::new("Number", TcaKind::Number),
            TypeDescriptor::new("Email", TcaKind::Email).searchable(),
            TypeDescriptor::new("Link", TcaKind::Link).searchable(),
            TypeDescriptor::new("Password", TcaKind::Password),
            TypeDescriptor::new("Color", TcaKind::Color),
            TypeDescriptor::new("DateTime", TcaKind::Datetime),
            TypeDescriptor::new("Checkbox", TcaKind::Check).with_items(ItemLabels::ByIndex),
            TypeDescriptor::new("Radio", TcaKind::Radio).with_items(ItemLabels::ByValue),
            TypeDescriptor::new("Select", TcaKind::Select).with_items(ItemLabels::ByValue),
            TypeDescriptor::new("Category", TcaKind::Category)
                .relational()
                .not_renderable(),
            TypeDescriptor::new("Relation", TcaKind::Group).relational(),
            TypeDescriptor::new("Folder", TcaKind::Folder).relational(),
            TypeDescriptor::new("File", TcaKind::File)
                .relational()
                .not_renderable(),
            TypeDescriptor::new("Collection", TcaKind::Inline)
                .with_kind(FieldKind::Collection)
                .relational()
                .not_renderable(),
            TypeDescriptor::new("FlexForm", TcaKind::Flex)
                .with_kind(FieldKind::FlexForm)
                .not_renderable(),
            TypeDescriptor::new("Language", TcaKind::Language),
            TypeDescriptor::new("Uuid", TcaKind::Uuid).not_renderable(),
            TypeDescriptor::new("Json", TcaKind::Json),
            TypeDescriptor::new("Slug", TcaKind::Slug).not_renderable(),
            TypeDescriptor::new("Country", TcaKind::Country),
            TypeDescriptor::new("Pass", TcaKind::Passthrough).not_renderable(),
            TypeDescriptor::structural("Palette", FieldKind::Palette),
            TypeDescriptor::structural("Tab", FieldKind::Tab),
            TypeDescriptor::structural("Linebreak", FieldKind::Linebreak),
        ];
        for descriptor in builtin {
            catalog.register(descriptor);
        }
        catalog
    }

    /// Registers a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Looks up a type by name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Returns `true` if the type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Iterates over all descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_names_are_sorted() {
        let names = FieldTypeCatalog::standard().names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Linebreak".to_string()));
    }

    #[test]
    fn test_structural_types_have_no_storage() {
        let catalog = FieldTypeCatalog::standard();
        for name in ["Palette", "Tab", "Linebreak"] {
            let descriptor = catalog.get(name).unwrap();
            assert_eq!(descriptor.tca, TcaKind::None);
            assert!(!descriptor.renderable);
        }
    }

    #[test]
    fn test_item_label_kinds() {
        let catalog = FieldTypeCatalog::standard();
        assert_eq!(catalog.get("Select").unwrap().items, ItemLabels::ByValue);
        assert_eq!(catalog.get("Checkbox").unwrap().items, ItemLabels::ByIndex);
        assert_eq!(catalog.get("Text").unwrap().items, ItemLabels::None);
    }

    #[test]
    fn test_register_overrides_existing() {
        let mut catalog = FieldTypeCatalog::standard();
        let before = catalog.len();
        catalog.register(TypeDescriptor::new("Text", TcaKind::Text));
        assert_eq!(catalog.len(), before);
        assert_eq!(catalog.get("Text").unwrap().tca, TcaKind::Text);

        catalog.register(TypeDescriptor::new("Rating", TcaKind::Number));
        assert_eq!(catalog.len(), before + 1);
    }
}
