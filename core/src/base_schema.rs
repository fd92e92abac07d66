//! Knowledge about columns that already exist on host tables.
//!
//! The compiler never consults global state to decide whether a field is
//! pre-existing; it asks an injected [`BaseSchema`] instead.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::catalog::{FieldTypeCatalog, TypeDescriptor};

/// Read-only view of the pre-existing schema of host tables.
pub trait BaseSchema {
    /// Returns the descriptor of an existing column, if known.
    fn get(&self, table: &str, field: &str) -> Option<&TypeDescriptor>;

    /// Returns `true` if the column exists.
    fn has(&self, table: &str, field: &str) -> bool {
        self.get(table, field).is_some()
    }
}

/// A base schema that knows no columns at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseSchema;

impl BaseSchema for NoBaseSchema {
    fn get(&self, _table: &str, _field: &str) -> Option<&TypeDescriptor> {
        None
    }
}

/// Columns of the host system's core tables.
const HOST_COLUMNS: &[(&str, &str, &str)] = &[
    ("tt_content", "CType", "Select"),
    ("tt_content", "header", "Text"),
    ("tt_content", "header_layout", "Select"),
    ("tt_content", "subheader", "Text"),
    ("tt_content", "bodytext", "Textarea"),
    ("tt_content", "image", "File"),
    ("tt_content", "assets", "File"),
    ("tt_content", "pi_flexform", "FlexForm"),
    ("tt_content", "categories", "Category"),
    ("pages", "doktype", "Select"),
    ("pages", "title", "Text"),
    ("pages", "slug", "Slug"),
    ("pages", "nav_title", "Text"),
    ("pages", "subtitle", "Text"),
    ("pages", "media", "File"),
    ("pages", "categories", "Category"),
    ("sys_file_reference", "type", "Select"),
    ("sys_file_reference", "title", "Text"),
    ("sys_file_reference", "alternative", "Text"),
    ("sys_file_reference", "description", "Textarea"),
    ("sys_file_reference", "link", "Link"),
];

/// An in-memory base schema.
///
/// # Examples
///
/// ```
/// use content_blocks_core::{BaseSchema, FieldTypeCatalog, StaticBaseSchema};
///
/// let catalog = FieldTypeCatalog::standard();
/// let mut base = StaticBaseSchema::new();
/// base.insert("tx_news", "title", catalog.get("Text").unwrap().clone());
///
/// assert!(base.has("tx_news", "title"));
/// assert!(!base.has("tx_news", "teaser"));
///
/// let host = StaticBaseSchema::host_defaults(&catalog);
/// assert!(host.has("tt_content", "CType"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticBaseSchema {
    tables: HashMap<String, IndexMap<String, TypeDescriptor>>,
}

impl StaticBaseSchema {
    /// Creates an empty base schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a base schema with the host core columns whose types are
    /// registered in `catalog`.
    pub fn host_defaults(catalog: &FieldTypeCatalog) -> Self {
        let mut schema = Self::new();
        for (table, field, type_name) in HOST_COLUMNS {
            if let Some(descriptor) = catalog.get(type_name) {
                schema.insert(table, field, descriptor.clone());
            }
        }
        schema
    }

    /// Registers an existing column.
    pub fn insert(&mut self, table: &str, field: &str, descriptor: TypeDescriptor) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(field.to_string(), descriptor);
    }

    /// Returns the known columns of a table in registration order.
    pub fn columns(&self, table: &str) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.tables
            .get(table)
            .into_iter()
            .flat_map(|columns| columns.iter().map(|(name, d)| (name.as_str(), d)))
    }

    /// Returns the number of known tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl BaseSchema for StaticBaseSchema {
    fn get(&self, table: &str, field: &str) -> Option<&TypeDescriptor> {
        self.tables.get(table).and_then(|columns| columns.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_base_schema_knows_nothing() {
        assert!(!NoBaseSchema.has("tt_content", "CType"));
    }

    #[test]
    fn test_host_defaults_skip_unregistered_types() {
        let mut catalog = FieldTypeCatalog::new();
        catalog.register(FieldTypeCatalog::standard().get("Text").unwrap().clone());

        let schema = StaticBaseSchema::host_defaults(&catalog);
        assert!(schema.has("pages", "title"));
        assert!(!schema.has("tt_content", "CType"));
    }

    #[test]
    fn test_columns_keep_registration_order() {
        let catalog = FieldTypeCatalog::standard();
        let text = catalog.get("Text").unwrap().clone();
        let mut schema = StaticBaseSchema::new();
        schema.insert("tx_demo", "b", text.clone());
        schema.insert("tx_demo", "a", text);

        let names: Vec<&str> = schema.columns("tx_demo").map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(schema.columns("missing").count(), 0);
    }
}
